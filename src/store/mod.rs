//! Persistence behind the HTTP handlers.
//!
//! [`Store`] is implemented twice: [`memory::MemoryStore`] keeps everything in
//! process (the default, optionally seeded with demo data) and
//! [`mysql::MySqlStore`] persists to MySQL through sqlx.

use async_trait::async_trait;

use crate::models::details::ProjectDetails;
use crate::models::project::{CreateProject, Project, ProjectOverview, ProjectScope, UpdateProject};
use crate::models::status::{CreateStatus, UpdateStatus};
use crate::models::tag::{CreateTag, UpdateTag};
use crate::models::task::{CreateTask, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

pub mod memory;
pub mod mysql;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, input: CreateUser) -> StoreResult<i32>;
    async fn update_user(&self, user_id: i32, input: UpdateUser) -> StoreResult<()>;

    // projects
    /// Projects the user is a member of, with member and task counts.
    async fn projects_for_member(&self, user_id: i32) -> StoreResult<Vec<ProjectOverview>>;
    async fn project_details(&self, project_id: i32) -> StoreResult<Option<ProjectDetails>>;
    async fn find_project(&self, project_id: i32) -> StoreResult<Option<Project>>;
    async fn project_scope(&self, project_id: i32) -> StoreResult<Option<ProjectScope>>;
    /// Creates the project with the creator as a member and the given initial statuses.
    async fn create_project(
        &self,
        input: CreateProject,
        initial_statuses: Vec<CreateStatus>,
    ) -> StoreResult<i32>;
    /// `members`, when present, replaces the member set; unknown user ids are dropped.
    async fn update_project(&self, project_id: i32, input: UpdateProject) -> StoreResult<()>;
    /// Removes the project together with its tasks, statuses, tags and memberships.
    async fn delete_project(&self, project_id: i32) -> StoreResult<()>;

    // statuses
    /// The project owning the status.
    async fn status_project(&self, status_id: i32) -> StoreResult<Option<i32>>;
    async fn create_status(&self, project_id: i32, input: CreateStatus) -> StoreResult<i32>;
    async fn update_status(&self, status_id: i32, input: UpdateStatus) -> StoreResult<()>;
    /// Fails with [`StoreError::Conflict`] while a task still uses the status.
    async fn delete_status(&self, status_id: i32) -> StoreResult<()>;

    // tags
    async fn tag_project(&self, tag_id: i32) -> StoreResult<Option<i32>>;
    async fn create_tag(&self, project_id: i32, input: CreateTag) -> StoreResult<i32>;
    async fn update_tag(&self, tag_id: i32, input: UpdateTag) -> StoreResult<()>;
    /// Also detaches the tag from every task.
    async fn delete_tag(&self, tag_id: i32) -> StoreResult<()>;

    // tasks
    async fn task_project(&self, task_id: i32) -> StoreResult<Option<i32>>;
    async fn create_task(&self, input: CreateTask) -> StoreResult<i32>;
    async fn update_task(&self, task_id: i32, input: UpdateTask) -> StoreResult<()>;
    async fn delete_task(&self, task_id: i32) -> StoreResult<()>;
}
