use async_trait::async_trait;
use log::{info, warn};
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ClientError, ClientResult};
use crate::models::details::{ProjectDetails, ProjectDetailsResponse};
use crate::models::user::User;
use crate::routes::auth::auth_models::{LoginRequest, LoginResponse, RegisterRequest};
use crate::routes::projects::projects_models::{
    CreateProjectRequest, UpdateProjectRequest, UserProjectsResponse,
};
use crate::routes::shared::IdResponse;
use crate::routes::status::status_models::{CreateStatusRequest, UpdateStatusRequest};
use crate::routes::tag::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::routes::tasks::tasks_models::{CreateTaskRequest, UpdateTaskRequest};
use crate::routes::users::users_models::{UpdateUserRequest, UsersResponse};

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    details: Vec<String>,
}

/// [`ApiClient`] over HTTP.
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpApiClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ClientResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = error_from_response(status, &body);
            warn!("Request failed with {}: {}", status, err);
            return Err(err);
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Validation(e.to_string()))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, i32)],
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(method, path).query(query).json(body)).await
    }

    async fn delete_by(&self, path: &str, key: &str, id: i32) -> ClientResult<IdResponse> {
        self.send(self.request(Method::DELETE, path).query(&[(key, id)]))
            .await
    }
}

/// Message from the body's `error` field, falling back to the status text.
fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let details = parsed.as_ref().map(|b| b.details.clone()).unwrap_or_default();
    let message = parsed
        .and_then(|b| b.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    if status == StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized(message)
    } else {
        ClientError::Api {
            status: status.as_u16(),
            message,
            details,
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        info!("Logging in as {}", email);
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/api/auth/login", &[], &req).await
    }

    async fn register(&self, req: &RegisterRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::POST, "/api/auth/register", &[], req).await
    }

    async fn get_users(&self) -> ClientResult<Vec<User>> {
        let response: UsersResponse = self.send(self.request(Method::GET, "/api/users")).await?;
        Ok(response.users)
    }

    async fn update_user(&self, user_id: i32, req: &UpdateUserRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::PUT, "/api/users", &[("uId", user_id)], req)
            .await
    }

    async fn get_user_projects(&self, user_id: i32) -> ClientResult<UserProjectsResponse> {
        self.send(
            self.request(Method::GET, "/api/projects/users")
                .query(&[("uId", user_id)]),
        )
        .await
    }

    async fn get_project_details(&self, project_id: i32) -> ClientResult<ProjectDetails> {
        let response: ProjectDetailsResponse = self
            .send(
                self.request(Method::GET, "/api/projects/details")
                    .query(&[("pId", project_id)]),
            )
            .await?;
        Ok(ProjectDetails::from_response(response))
    }

    async fn create_project(&self, req: &CreateProjectRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::POST, "/api/projects", &[], req).await
    }

    async fn update_project(
        &self,
        project_id: i32,
        req: &UpdateProjectRequest,
    ) -> ClientResult<IdResponse> {
        self.send_json(Method::PUT, "/api/projects", &[("pId", project_id)], req)
            .await
    }

    async fn delete_project(&self, project_id: i32) -> ClientResult<IdResponse> {
        self.delete_by("/api/projects", "pId", project_id).await
    }

    async fn create_status(&self, req: &CreateStatusRequest) -> ClientResult<IdResponse> {
        self.send_json(
            Method::POST,
            "/api/projects/status",
            &[("pId", req.project_id)],
            req,
        )
        .await
    }

    async fn update_status(
        &self,
        status_id: i32,
        req: &UpdateStatusRequest,
    ) -> ClientResult<IdResponse> {
        self.send_json(Method::PUT, "/api/projects/status", &[("sId", status_id)], req)
            .await
    }

    async fn delete_status(&self, status_id: i32) -> ClientResult<IdResponse> {
        self.delete_by("/api/projects/status", "sId", status_id).await
    }

    async fn create_tag(&self, req: &CreateTagRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::POST, "/api/projects/tag", &[("pId", req.project_id)], req)
            .await
    }

    async fn update_tag(&self, tag_id: i32, req: &UpdateTagRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::PUT, "/api/projects/tag", &[("tId", tag_id)], req)
            .await
    }

    async fn delete_tag(&self, tag_id: i32) -> ClientResult<IdResponse> {
        self.delete_by("/api/projects/tag", "tId", tag_id).await
    }

    async fn create_task(&self, req: &CreateTaskRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::POST, "/api/tasks", &[("pId", req.project_id)], req)
            .await
    }

    async fn update_task(&self, task_id: i32, req: &UpdateTaskRequest) -> ClientResult<IdResponse> {
        self.send_json(Method::PUT, "/api/tasks", &[("tId", task_id)], req)
            .await
    }

    async fn delete_task(&self, task_id: i32) -> ClientResult<IdResponse> {
        self.delete_by("/api/tasks", "tId", task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_comes_from_body() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            br#"{"error":"Invalid request","code":"VALIDATION_ERROR","details":["name must not be empty"]}"#,
        );
        assert_eq!(
            err,
            ClientError::Api {
                status: 400,
                message: "Invalid request".into(),
                details: vec!["name must not be empty".into()],
            }
        );
    }

    #[test]
    fn unauthorized_and_opaque_bodies() {
        assert_eq!(
            error_from_response(StatusCode::UNAUTHORIZED, br#"{"error":"Invalid token"}"#),
            ClientError::Unauthorized("Invalid token".into())
        );
        assert_eq!(
            error_from_response(StatusCode::BAD_GATEWAY, b"<html>"),
            ClientError::Api {
                status: 502,
                message: "Bad Gateway".into(),
                details: vec![],
            }
        );
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let client = HttpApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.token(), None);
        client.set_token(Some("abc".into()));
        assert_eq!(client.token().as_deref(), Some("abc"));
    }
}
