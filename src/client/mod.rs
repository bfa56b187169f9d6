//! Typed client for the HTTP API and the optimistic stores built on it.

use async_trait::async_trait;

use crate::models::details::ProjectDetails;
use crate::models::user::User;
use crate::routes::auth::auth_models::{LoginResponse, RegisterRequest};
use crate::routes::projects::projects_models::{
    CreateProjectRequest, UpdateProjectRequest, UserProjectsResponse,
};
use crate::routes::shared::IdResponse;
use crate::routes::status::status_models::{CreateStatusRequest, UpdateStatusRequest};
use crate::routes::tag::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::routes::tasks::tasks_models::{CreateTaskRequest, UpdateTaskRequest};
use crate::routes::users::users_models::UpdateUserRequest;

pub mod http;
pub mod project_details;
pub mod workspace;

pub use http::HttpApiClient;
pub use project_details::{Notice, ProjectDetailsState, ProjectDetailsStore};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Vec<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Validation(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// One method per endpoint. Mutations resolve to the affected id.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Token sent with every later request; `None` signs out.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse>;
    async fn register(&self, req: &RegisterRequest) -> ClientResult<IdResponse>;

    async fn get_users(&self) -> ClientResult<Vec<User>>;
    async fn update_user(&self, user_id: i32, req: &UpdateUserRequest) -> ClientResult<IdResponse>;

    async fn get_user_projects(&self, user_id: i32) -> ClientResult<UserProjectsResponse>;
    /// Details with ids restored inside `tag_map` and `status_map`.
    async fn get_project_details(&self, project_id: i32) -> ClientResult<ProjectDetails>;
    async fn create_project(&self, req: &CreateProjectRequest) -> ClientResult<IdResponse>;
    async fn update_project(&self, project_id: i32, req: &UpdateProjectRequest) -> ClientResult<IdResponse>;
    async fn delete_project(&self, project_id: i32) -> ClientResult<IdResponse>;

    async fn create_status(&self, req: &CreateStatusRequest) -> ClientResult<IdResponse>;
    async fn update_status(&self, status_id: i32, req: &UpdateStatusRequest) -> ClientResult<IdResponse>;
    async fn delete_status(&self, status_id: i32) -> ClientResult<IdResponse>;

    async fn create_tag(&self, req: &CreateTagRequest) -> ClientResult<IdResponse>;
    async fn update_tag(&self, tag_id: i32, req: &UpdateTagRequest) -> ClientResult<IdResponse>;
    async fn delete_tag(&self, tag_id: i32) -> ClientResult<IdResponse>;

    async fn create_task(&self, req: &CreateTaskRequest) -> ClientResult<IdResponse>;
    async fn update_task(&self, task_id: i32, req: &UpdateTaskRequest) -> ClientResult<IdResponse>;
    async fn delete_task(&self, task_id: i32) -> ClientResult<IdResponse>;
}
