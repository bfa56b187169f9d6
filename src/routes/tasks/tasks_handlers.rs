use actix_web::{web, HttpResponse};
use log::{error, info};

use super::tasks_models::{CreateTaskRequest, TaskQuery, UpdateTaskRequest};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::project::ProjectScope;
use crate::routes::shared::{check_body_id, member_scope, require_id, IdResponse};
use crate::state::AppState;
use crate::validation::Validate;

fn check_status(scope: &ProjectScope, status_id: i32) -> AppResult<()> {
    if scope.has_status(status_id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Status {} does not belong to project {}",
            status_id, scope.project_id
        )))
    }
}

async fn owning_project(state: &AppState, task_id: i32) -> AppResult<i32> {
    state
        .store
        .task_project(task_id)
        .await
        .inspect_err(|e| error!("Failed to look up task {}: {}", task_id, e))?
        .ok_or_else(|| AppError::NotFound(format!("Task with id {task_id} not found")))
}

pub async fn create_task(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TaskQuery>,
    req: web::Json<CreateTaskRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner().validated()?;
    if let Some(project_id) = query.project_id {
        check_body_id(Some(req.project_id), project_id, "pId")?;
    }
    info!("Received request to create task {} in project {}", req.name, req.project_id);

    let scope = member_scope(&state, req.project_id, auth.user_id).await?;
    check_status(&scope, req.status_id)?;

    let id = state
        .store
        .create_task(req.into_create(auth.user_id, &scope))
        .await
        .inspect_err(|e| error!("Failed to create task: {}", e))?;

    info!("Task {} created in project {}", id, scope.project_id);
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn update_task(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TaskQuery>,
    req: web::Json<UpdateTaskRequest>,
) -> AppResult<HttpResponse> {
    let task_id = require_id(query.task_id, "tId")?;
    let req = req.into_inner().validated()?;
    check_body_id(req.id, task_id, "tId")?;
    info!("Received request to update task {}", task_id);

    let project_id = owning_project(&state, task_id).await?;
    let scope = member_scope(&state, project_id, auth.user_id).await?;
    if let Some(status_id) = req.status_id {
        check_status(&scope, status_id)?;
    }

    state
        .store
        .update_task(task_id, req.into_update(&scope))
        .await
        .inspect_err(|e| error!("Failed to update task {}: {}", task_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: task_id }))
}

pub async fn delete_task(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TaskQuery>,
) -> AppResult<HttpResponse> {
    let task_id = require_id(query.task_id.or(query.id), "tId")?;
    info!("Received request to delete task {}", task_id);

    let project_id = owning_project(&state, task_id).await?;
    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .delete_task(task_id)
        .await
        .inspect_err(|e| error!("Failed to delete task {}: {}", task_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: task_id }))
}
