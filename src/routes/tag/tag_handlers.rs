use actix_web::{web, HttpResponse};
use log::{error, info};

use super::tag_models::{CreateTagRequest, TagQuery, UpdateTagRequest};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::routes::shared::{check_body_id, member_scope, require_id, IdResponse};
use crate::state::AppState;
use crate::validation::Validate;

async fn owning_project(state: &AppState, tag_id: i32) -> AppResult<i32> {
    state
        .store
        .tag_project(tag_id)
        .await
        .inspect_err(|e| error!("Failed to look up tag {}: {}", tag_id, e))?
        .ok_or_else(|| AppError::NotFound(format!("Tag with id {tag_id} not found")))
}

pub async fn create_tag(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TagQuery>,
    req: web::Json<CreateTagRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner().validated()?;
    if let Some(project_id) = query.project_id {
        check_body_id(Some(req.project_id), project_id, "pId")?;
    }
    let project_id = req.project_id;
    info!("Received request to create tag {} in project {}", req.name, project_id);

    member_scope(&state, project_id, auth.user_id).await?;
    let id = state
        .store
        .create_tag(project_id, req.into())
        .await
        .inspect_err(|e| error!("Failed to create tag: {}", e))?;

    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn update_tag(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TagQuery>,
    req: web::Json<UpdateTagRequest>,
) -> AppResult<HttpResponse> {
    let tag_id = require_id(query.tag_id, "tId")?;
    let req = req.into_inner().validated()?;
    check_body_id(req.id, tag_id, "tId")?;
    info!("Received request to update tag {}", tag_id);

    let project_id = owning_project(&state, tag_id).await?;
    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .update_tag(tag_id, req.into())
        .await
        .inspect_err(|e| error!("Failed to update tag {}: {}", tag_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: tag_id }))
}

// Deleting a tag also detaches it from every task
pub async fn delete_tag(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<TagQuery>,
) -> AppResult<HttpResponse> {
    let tag_id = require_id(query.tag_id, "tId")?;
    info!("Received request to delete tag {}", tag_id);

    let project_id = owning_project(&state, tag_id).await?;
    member_scope(&state, project_id, auth.user_id).await?;
    state
        .store
        .delete_tag(tag_id)
        .await
        .inspect_err(|e| error!("Failed to delete tag {}: {}", tag_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: tag_id }))
}
