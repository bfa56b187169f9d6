use actix_web::{web, HttpResponse};
use log::{error, info};

use super::users_models::{UpdateUserRequest, UserQuery, UsersResponse};
use crate::auth::password::hash_password;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::user::UpdateUser;
use crate::routes::auth::auth_handlers::create_account;
use crate::routes::auth::auth_models::RegisterRequest;
use crate::routes::shared::{require_id, IdResponse};
use crate::state::AppState;
use crate::validation::Validate;

pub async fn list_users(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    info!("Received request to list users");
    let users = state
        .store
        .list_users()
        .await
        .inspect_err(|e| error!("Failed to list users: {}", e))?;
    Ok(HttpResponse::Ok().json(UsersResponse { users }))
}

pub async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let id = create_account(&state, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

// Users may only edit their own profile
pub async fn update_user(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<UserQuery>,
    req: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let user_id = require_id(query.user_id, "uId")?;
    let req = req.into_inner().validated()?;
    info!("Received request to update user {}", user_id);

    if auth.user_id != user_id {
        return Err(AppError::Forbidden("You can only update your own profile".into()));
    }

    let password_hash = req.password.as_deref().map(hash_password).transpose()?;
    state
        .store
        .update_user(
            user_id,
            UpdateUser {
                name: req.name.map(|name| name.trim().to_string()),
                email: req.email,
                password_hash,
            },
        )
        .await
        .inspect_err(|e| error!("Failed to update user {}: {}", user_id, e))?;

    Ok(HttpResponse::Ok().json(IdResponse { id: user_id }))
}
