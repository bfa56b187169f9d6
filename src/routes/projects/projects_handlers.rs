use actix_web::{web, HttpResponse};
use log::{error, info};

use super::projects_models::{
    CreateProjectRequest, ProjectQuery, UpdateProjectRequest, UserProjectsQuery,
    UserProjectsResponse,
};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::status::default_statuses;
use crate::routes::shared::{check_body_id, member_scope, require_id, IdResponse};
use crate::state::AppState;
use crate::validation::Validate;

pub async fn create_project(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateProjectRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner().validated()?;
    info!("Received request to create project: {}", req.name);

    let id = state
        .store
        .create_project(req.into_create(auth.user_id), default_statuses())
        .await
        .inspect_err(|e| error!("Failed to create project: {}", e))?;

    info!("Project {} created by user {}", id, auth.user_id);
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn update_project(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ProjectQuery>,
    req: web::Json<UpdateProjectRequest>,
) -> AppResult<HttpResponse> {
    let project_id = require_id(query.project_id, "pId")?;
    let req = req.into_inner().validated()?;
    check_body_id(req.id, project_id, "pId")?;
    info!("Received request to update project {}", project_id);

    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .update_project(project_id, req.into())
        .await
        .inspect_err(|e| error!("Failed to update project {}: {}", project_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: project_id }))
}

pub async fn delete_project(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ProjectQuery>,
) -> AppResult<HttpResponse> {
    let project_id = require_id(query.project_id, "pId")?;
    info!("Received request to delete project {}", project_id);

    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .delete_project(project_id)
        .await
        .inspect_err(|e| error!("Failed to delete project {}: {}", project_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: project_id }))
}

// Workspace listing for the caller
pub async fn user_projects(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<UserProjectsQuery>,
) -> AppResult<HttpResponse> {
    let user_id = require_id(query.user_id, "uId")?;
    info!("Received request to list projects of user {}", user_id);

    if auth.user_id != user_id {
        return Err(AppError::Forbidden("You can only list your own projects".into()));
    }

    let projects = state
        .store
        .projects_for_member(user_id)
        .await
        .inspect_err(|e| error!("Failed to list projects of user {}: {}", user_id, e))?;

    Ok(HttpResponse::Ok().json(UserProjectsResponse { user_id, projects }))
}

pub async fn project_details(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<ProjectQuery>,
) -> AppResult<HttpResponse> {
    let project_id = require_id(query.project_id, "pId")?;
    info!("Received request for details of project {}", project_id);

    member_scope(&state, project_id, auth.user_id).await?;
    let details = state
        .store
        .project_details(project_id)
        .await
        .inspect_err(|e| error!("Failed to load project {}: {}", project_id, e))?
        .ok_or_else(|| AppError::NotFound(format!("Project with id {project_id} not found")))?;

    Ok(HttpResponse::Ok().json(details.to_response()))
}
