use actix_web::cookie::Cookie;
use actix_web::{web, HttpResponse};
use log::{error, info};

use super::auth_models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::auth::jwt::issue_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::models::user::CreateUser;
use crate::routes::shared::IdResponse;
use crate::state::AppState;
use crate::validation::Validate;

// Check credentials and hand out a token
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner().validated()?;
    info!("Received request to log in user: {}", req.email);

    let credentials = state
        .store
        .find_credentials_by_email(&req.email)
        .await
        .inspect_err(|e| error!("Failed to look up user {}: {}", req.email, e))?;
    let Some(credentials) = credentials else {
        info!("No user with email {}", req.email);
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    };

    if !verify_password(&req.password, &credentials.password_hash)? {
        info!("Wrong password for {}", req.email);
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let user = state
        .store
        .find_user(credentials.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} vanished during login", credentials.id)))?;
    let token = issue_token(user.id, &user.email, &state.jwt)?;

    info!("User {} logged in successfully", user.id);
    Ok(HttpResponse::Ok()
        .cookie(
            Cookie::build("token", token.clone())
                .path("/")
                .http_only(true)
                .finish(),
        )
        .json(LoginResponse { token, user }))
}

// Register user to the store
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let id = create_account(&state, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub(crate) async fn create_account(state: &AppState, req: RegisterRequest) -> AppResult<i32> {
    let req = req.validated()?;
    info!("Received request to register user: {}", req.email);

    let password_hash = hash_password(&req.password)?;
    let id = state
        .store
        .create_user(CreateUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
            profile_picture: None,
        })
        .await
        .inspect_err(|e| error!("Failed to register user: {}", e))?;

    info!("User {} registered successfully", id);
    Ok(id)
}
