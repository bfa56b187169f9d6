use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::project::ProjectScope;
use crate::state::AppState;

/// Body of every mutation response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: i32,
}

/// A required query id: present and positive.
pub fn require_id(value: Option<i32>, key: &str) -> AppResult<i32> {
    match value {
        None => Err(AppError::BadRequest(format!("{key} is required"))),
        Some(id) if id <= 0 => Err(AppError::BadRequest(format!(
            "{key} must be a positive integer"
        ))),
        Some(id) => Ok(id),
    }
}

/// A body id, when present, must agree with the id taken from the query.
pub fn check_body_id(body: Option<i32>, query: i32, key: &str) -> AppResult<()> {
    match body {
        Some(id) if id != query => Err(AppError::BadRequest(format!(
            "body id {id} does not match {key}={query}"
        ))),
        _ => Ok(()),
    }
}

/// Loads the project's scope, failing with 404 when it does not exist and 403
/// when `user_id` is not a member.
pub async fn member_scope(
    state: &AppState,
    project_id: i32,
    user_id: i32,
) -> AppResult<ProjectScope> {
    let scope = state
        .store
        .project_scope(project_id)
        .await
        .inspect_err(|e| error!("Failed to load project {}: {}", project_id, e))?
        .ok_or_else(|| AppError::NotFound(format!("Project with id {project_id} not found")))?;

    if !scope.is_member(user_id) {
        info!("User {} is not a member of project {}", user_id, project_id);
        return Err(AppError::Forbidden(format!(
            "Not a member of project {project_id}"
        )));
    }
    Ok(scope)
}

/// Turns JSON payload errors into the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _: &HttpRequest| {
        info!("Rejected JSON payload: {}", err);
        AppError::BadRequest(format!("Invalid JSON body: {err}")).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _: &HttpRequest| {
        info!("Rejected query string: {}", err);
        AppError::BadRequest(format!("Invalid query string: {err}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_non_positive_ids_are_rejected() {
        assert_eq!(require_id(Some(3), "pId").unwrap(), 3);
        let missing = require_id(None, "pId").unwrap_err();
        assert_eq!(missing.to_string(), "pId is required");
        assert!(require_id(Some(0), "tId").is_err());
        assert!(require_id(Some(-4), "tId").is_err());
    }

    #[test]
    fn body_id_must_match_query() {
        assert!(check_body_id(None, 5, "sId").is_ok());
        assert!(check_body_id(Some(5), 5, "sId").is_ok());
        assert!(check_body_id(Some(6), 5, "sId").is_err());
    }
}
