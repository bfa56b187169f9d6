use actix_web::{web, HttpResponse};
use log::{error, info};

use super::status_models::{CreateStatusRequest, StatusQuery, UpdateStatusRequest};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::routes::shared::{check_body_id, member_scope, require_id, IdResponse};
use crate::state::AppState;
use crate::validation::Validate;

/// The project owning `status_id`, or 404.
async fn owning_project(state: &AppState, status_id: i32) -> AppResult<i32> {
    state
        .store
        .status_project(status_id)
        .await
        .inspect_err(|e| error!("Failed to look up status {}: {}", status_id, e))?
        .ok_or_else(|| AppError::NotFound(format!("Status with id {status_id} not found")))
}

pub async fn create_status(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<StatusQuery>,
    req: web::Json<CreateStatusRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner().validated()?;
    if let Some(project_id) = query.project_id {
        check_body_id(Some(req.project_id), project_id, "pId")?;
    }
    let project_id = req.project_id;
    info!("Received request to create status {} in project {}", req.name, project_id);

    member_scope(&state, project_id, auth.user_id).await?;
    let id = state
        .store
        .create_status(project_id, req.into())
        .await
        .inspect_err(|e| error!("Failed to create status: {}", e))?;

    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn update_status(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<StatusQuery>,
    req: web::Json<UpdateStatusRequest>,
) -> AppResult<HttpResponse> {
    let status_id = require_id(query.status_id, "sId")?;
    let req = req.into_inner().validated()?;
    check_body_id(req.id, status_id, "sId")?;
    info!("Received request to update status {}", status_id);

    let project_id = owning_project(&state, status_id).await?;
    if let Some(claimed) = req.project_id {
        if claimed != project_id {
            return Err(AppError::BadRequest(format!(
                "Status {status_id} does not belong to project {claimed}"
            )));
        }
    }
    member_scope(&state, project_id, auth.user_id).await?;

    state
        .store
        .update_status(status_id, req.into())
        .await
        .inspect_err(|e| error!("Failed to update status {}: {}", status_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: status_id }))
}

pub async fn delete_status(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<StatusQuery>,
) -> AppResult<HttpResponse> {
    let status_id = require_id(query.status_id, "sId")?;
    info!("Received request to delete status {}", status_id);

    let project_id = owning_project(&state, status_id).await?;
    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .delete_status(status_id)
        .await
        .inspect_err(|e| info!("Status {} was not deleted: {}", status_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: status_id }))
}
