use std::future::{ready, Ready};

use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::http::Method;
use actix_web::middleware::Next;
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest, ResponseError};
use log::info;

use super::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Routes reachable without a token.
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/api/auth/login"),
    ("POST", "/api/auth/register"),
    ("GET", "/api/users"),
    ("POST", "/api/users"),
];

pub fn is_public(method: &Method, path: &str) -> bool {
    let path = normalize_path(path);
    PUBLIC_ROUTES
        .iter()
        .any(|(public_method, public_path)| *public_method == method.as_str() && *public_path == path)
}

fn normalize_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// `Authorization: Bearer <token>` first, then the `token` cookie.
fn request_token(req: &ServiceRequest) -> Option<String> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    header.or_else(|| req.cookie("token").map(|cookie| cookie.value().to_string()))
}

/// Rejects non-public requests that lack a valid token and stores the claims
/// of accepted ones in the request extensions.
pub async fn require_token(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if is_public(req.method(), req.path()) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let rejection = match req.app_data::<web::Data<AppState>>() {
        None => Some(AppError::Internal("application state is not registered".into())),
        Some(state) => match request_token(&req) {
            None => Some(AppError::Unauthorized("No token provided".into())),
            Some(token) => match validate_token(&token, &state.jwt) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    None
                }
                Err(e) => {
                    info!("Rejected token for {}: {}", req.path(), e);
                    Some(AppError::Unauthorized("Invalid token".into()))
                }
            },
        },
    };

    if let Some(err) = rejection {
        let response = err.error_response().map_into_right_body();
        return Ok(req.into_response(response));
    }

    Ok(next.call(req).await?.map_into_left_body())
}

/// The caller behind an accepted token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<Claims>()
            .map(|claims| AuthUser {
                user_id: claims.sub,
                email: claims.email.clone(),
            })
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()));
        ready(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_ignore_trailing_slash() {
        assert!(is_public(&Method::POST, "/api/auth/login"));
        assert!(is_public(&Method::POST, "/api/auth/login/"));
        assert!(is_public(&Method::GET, "/api/users"));
    }

    #[test]
    fn method_matters() {
        assert!(!is_public(&Method::GET, "/api/auth/login"));
        assert!(!is_public(&Method::PUT, "/api/users"));
    }

    #[test]
    fn everything_else_is_protected() {
        assert!(!is_public(&Method::GET, "/api/projects/details"));
        assert!(!is_public(&Method::DELETE, "/api/tasks"));
    }
}
