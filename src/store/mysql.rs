//! MySQL-backed [`Store`].

use std::collections::HashMap;

use async_trait::async_trait;
use log::info;
use sqlx::mysql::{MySqlConnection, MySqlPool, MySqlPoolOptions};

use super::{Store, StoreError, StoreResult};
use crate::models::details::ProjectDetails;
use crate::models::project::{CreateProject, Project, ProjectOverview, ProjectScope, UpdateProject};
use crate::models::status::{CreateStatus, Status, UpdateStatus};
use crate::models::tag::{CreateTag, Tag, UpdateTag};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

const USER_COLUMNS: &str = "id, name, email, profile_picture";
const PROJECT_COLUMNS: &str = "id, name, description, created_by, created_at, updated_at";
const TASK_COLUMNS: &str = "id, created_by, name, content, start_time, end_time, \
                            created_at, updated_at, status_id, priority";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Opens the pool and applies pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        info!("Connected to MySQL with up to {} connections", max_connections);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn members(&self, project_id: i32) -> StoreResult<Vec<i32>> {
        Ok(sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM project_members WHERE project_id = ? ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn owner(&self, table: &str, id: i32) -> StoreResult<Option<i32>> {
        let query = format!("SELECT project_id FROM {table} WHERE id = ?");
        Ok(sqlx::query_scalar::<_, i32>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

fn id_of(last_insert_id: u64) -> StoreResult<i32> {
    i32::try_from(last_insert_id).map_err(|_| {
        StoreError::Database(sqlx::Error::Protocol(format!(
            "insert id {last_insert_id} is out of range"
        )))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false)
}

/// Existing user ids from `ids`, deduplicated, in request order.
async fn existing_users(conn: &mut MySqlConnection, ids: &[i32]) -> StoreResult<Vec<i32>> {
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        if kept.contains(id) {
            continue;
        }
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_some() {
            kept.push(*id);
        }
    }
    Ok(kept)
}

async fn replace_members(conn: &mut MySqlConnection, project_id: i32, members: &[i32]) -> StoreResult<()> {
    sqlx::query("DELETE FROM project_members WHERE project_id = ?")
        .bind(project_id)
        .execute(&mut *conn)
        .await?;
    for user_id in members {
        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, ?)")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_task_links(
    conn: &mut MySqlConnection,
    task_id: i32,
    tag_ids: Option<&[i32]>,
    assigned_to: Option<&[i32]>,
) -> StoreResult<()> {
    if let Some(tag_ids) = tag_ids {
        sqlx::query("DELETE FROM task_tags WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT INTO task_tags (task_id, tag_id) VALUES (?, ?)")
                .bind(task_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }
    }
    if let Some(assigned_to) = assigned_to {
        sqlx::query("DELETE FROM task_assignments WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
        for user_id in assigned_to {
            sqlx::query("INSERT INTO task_assignments (task_id, user_id) VALUES (?, ?)")
                .bind(task_id)
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
        }
    }
    Ok(())
}

async fn insert_status(conn: &mut MySqlConnection, project_id: i32, input: &CreateStatus) -> StoreResult<i32> {
    let result = sqlx::query(
        "INSERT INTO task_statuses (project_id, name, description, color) VALUES (?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.color)
    .execute(&mut *conn)
    .await?;
    id_of(result.last_insert_id())
}

#[async_trait]
impl Store for MySqlStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        Ok(sqlx::query_as::<_, User>(&query).fetch_all(&self.pool).await?)
    }

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        Ok(sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM users WHERE LOWER(email) = LOWER(?)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<i32> {
        let result = sqlx::query(
            "INSERT INTO users (name, email, password_hash, profile_picture) VALUES (?, ?, ?, ?)",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.profile_picture)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => id_of(done.last_insert_id()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict("User already exists".into())),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user(&self, user_id: i32, input: UpdateUser) -> StoreResult<()> {
        if self.find_user(user_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "User", id: user_id });
        }
        let result = sqlx::query(
            "UPDATE users SET
                name = COALESCE(?, name),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash)
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::Conflict("Email is already in use".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn projects_for_member(&self, user_id: i32) -> StoreResult<Vec<ProjectOverview>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE id IN (SELECT project_id FROM project_members WHERE user_id = ?)
             ORDER BY id"
        );
        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut overviews = Vec::with_capacity(projects.len());
        for project in projects {
            let num_members: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM project_members WHERE project_id = ?")
                    .bind(project.id)
                    .fetch_one(&self.pool)
                    .await?;
            let num_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
                .bind(project.id)
                .fetch_one(&self.pool)
                .await?;
            overviews.push(ProjectOverview {
                num_members: Some(num_members),
                num_tasks: Some(num_tasks),
                members: None,
                ..project.overview()
            });
        }
        Ok(overviews)
    }

    async fn project_details(&self, project_id: i32) -> StoreResult<Option<ProjectDetails>> {
        let Some(project) = self.find_project(project_id).await? else {
            return Ok(None);
        };

        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ? ORDER BY id");
        let mut tasks = sqlx::query_as::<_, Task>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        let tag_links = sqlx::query_as::<_, (i32, i32)>(
            "SELECT tt.task_id, tt.tag_id FROM task_tags tt
             JOIN tasks t ON t.id = tt.task_id
             WHERE t.project_id = ? ORDER BY tt.tag_id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        let assignments = sqlx::query_as::<_, (i32, i32)>(
            "SELECT ta.task_id, ta.user_id FROM task_assignments ta
             JOIN tasks t ON t.id = ta.task_id
             WHERE t.project_id = ? ORDER BY ta.user_id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_task: HashMap<i32, &mut Task> = tasks.iter_mut().map(|task| (task.id, task)).collect();
        for (task_id, tag_id) in tag_links {
            if let Some(task) = by_task.get_mut(&task_id) {
                task.tag_ids.push(tag_id);
            }
        }
        for (task_id, user_id) in assignments {
            if let Some(task) = by_task.get_mut(&task_id) {
                task.assigned_to.push(user_id);
            }
        }

        let statuses = sqlx::query_as::<_, Status>(
            "SELECT id, name, description, color FROM task_statuses WHERE project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name, color FROM project_tags WHERE project_id = ?")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(ProjectDetails {
            project: project.overview(),
            tasks,
            tag_map: tags.into_iter().map(|tag| (tag.id, tag)).collect(),
            status_map: statuses.into_iter().map(|status| (status.id, status)).collect(),
        }))
    }

    async fn find_project(&self, project_id: i32) -> StoreResult<Option<Project>> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        match project {
            Some(mut project) => {
                project.members = self.members(project_id).await?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    async fn project_scope(&self, project_id: i32) -> StoreResult<Option<ProjectScope>> {
        if self.find_project(project_id).await?.is_none() {
            return Ok(None);
        }
        let status_ids = sqlx::query_scalar::<_, i32>("SELECT id FROM task_statuses WHERE project_id = ? ORDER BY id")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        let tag_ids = sqlx::query_scalar::<_, i32>("SELECT id FROM project_tags WHERE project_id = ? ORDER BY id")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(Some(ProjectScope {
            project_id,
            members: self.members(project_id).await?,
            status_ids,
            tag_ids,
        }))
    }

    async fn create_project(
        &self,
        input: CreateProject,
        initial_statuses: Vec<CreateStatus>,
    ) -> StoreResult<i32> {
        let mut tx = self.pool.begin().await?;

        let mut requested = vec![input.created_by];
        requested.extend_from_slice(&input.members);
        let members = existing_users(&mut tx, &requested).await?;
        if !members.contains(&input.created_by) {
            return Err(StoreError::NotFound { entity: "User", id: input.created_by });
        }

        let result = sqlx::query("INSERT INTO projects (name, description, created_by) VALUES (?, ?, ?)")
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.created_by)
            .execute(&mut *tx)
            .await?;
        let project_id = id_of(result.last_insert_id())?;

        replace_members(&mut tx, project_id, &members).await?;
        for status in &initial_statuses {
            insert_status(&mut tx, project_id, status).await?;
        }

        tx.commit().await?;
        Ok(project_id)
    }

    async fn update_project(&self, project_id: i32, input: UpdateProject) -> StoreResult<()> {
        if self.find_project(project_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE projects SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(project_id)
        .execute(&mut *tx)
        .await?;

        if let Some(requested) = &input.members {
            let members = existing_users(&mut tx, requested).await?;
            replace_members(&mut tx, project_id, &members).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_project(&self, project_id: i32) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Tasks first: they reference the project's statuses.
        sqlx::query("DELETE FROM tasks WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        for table in ["task_statuses", "project_tags", "project_members"] {
            let query = format!("DELETE FROM {table} WHERE project_id = ?");
            sqlx::query(&query).bind(project_id).execute(&mut *tx).await?;
        }
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn status_project(&self, status_id: i32) -> StoreResult<Option<i32>> {
        self.owner("task_statuses", status_id).await
    }

    async fn create_status(&self, project_id: i32, input: CreateStatus) -> StoreResult<i32> {
        if self.find_project(project_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        let mut conn = self.pool.acquire().await?;
        insert_status(&mut conn, project_id, &input).await
    }

    async fn update_status(&self, status_id: i32, input: UpdateStatus) -> StoreResult<()> {
        if self.status_project(status_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Status", id: status_id });
        }
        sqlx::query(
            "UPDATE task_statuses SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                color = COALESCE(?, color)
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.color)
        .bind(status_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_status(&self, status_id: i32) -> StoreResult<()> {
        let in_use_conflict = |in_use: i64| {
            StoreError::Conflict(format!("Status {status_id} is still used by {in_use} task(s)"))
        };
        let mut tx = self.pool.begin().await?;

        // The row lock holds off tasks that would start referencing the status.
        let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM task_statuses WHERE id = ? FOR UPDATE")
            .bind(status_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(StoreError::NotFound { entity: "Status", id: status_id });
        }
        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE status_id = ?")
            .bind(status_id)
            .fetch_one(&mut *tx)
            .await?;
        if in_use > 0 {
            return Err(in_use_conflict(in_use));
        }
        sqlx::query("DELETE FROM task_statuses WHERE id = ?")
            .bind(status_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    in_use_conflict(1)
                } else {
                    err.into()
                }
            })?;
        tx.commit().await?;
        Ok(())
    }

    async fn tag_project(&self, tag_id: i32) -> StoreResult<Option<i32>> {
        self.owner("project_tags", tag_id).await
    }

    async fn create_tag(&self, project_id: i32, input: CreateTag) -> StoreResult<i32> {
        if self.find_project(project_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        let result = sqlx::query("INSERT INTO project_tags (project_id, name, color) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.color)
            .execute(&self.pool)
            .await?;
        id_of(result.last_insert_id())
    }

    async fn update_tag(&self, tag_id: i32, input: UpdateTag) -> StoreResult<()> {
        if self.tag_project(tag_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Tag", id: tag_id });
        }
        sqlx::query(
            "UPDATE project_tags SET name = COALESCE(?, name), color = COALESCE(?, color) WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.color)
        .bind(tag_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_tag(&self, tag_id: i32) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM task_tags WHERE tag_id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM project_tags WHERE id = ?")
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "Tag", id: tag_id });
        }
        tx.commit().await?;
        Ok(())
    }

    async fn task_project(&self, task_id: i32) -> StoreResult<Option<i32>> {
        self.owner("tasks", task_id).await
    }

    async fn create_task(&self, input: CreateTask) -> StoreResult<i32> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO tasks (project_id, created_by, name, content, start_time, end_time, status_id, priority)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.project_id)
        .bind(input.created_by)
        .bind(&input.name)
        .bind(&input.content)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.status_id)
        .bind(input.priority)
        .execute(&mut *tx)
        .await?;
        let task_id = id_of(result.last_insert_id())?;

        replace_task_links(&mut tx, task_id, Some(&input.tag_ids), Some(&input.assigned_to)).await?;
        tx.commit().await?;
        Ok(task_id)
    }

    async fn update_task(&self, task_id: i32, input: UpdateTask) -> StoreResult<()> {
        if self.task_project(task_id).await?.is_none() {
            return Err(StoreError::NotFound { entity: "Task", id: task_id });
        }
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE tasks SET
                name = COALESCE(?, name),
                content = COALESCE(?, content),
                start_time = COALESCE(?, start_time),
                end_time = COALESCE(?, end_time),
                status_id = COALESCE(?, status_id),
                priority = COALESCE(?, priority),
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.content)
        .bind(input.start_time)
        .bind(input.end_time)
        .bind(input.status_id)
        .bind(input.priority)
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

        replace_task_links(
            &mut tx,
            task_id,
            input.tag_ids.as_deref(),
            input.assigned_to.as_deref(),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_task(&self, task_id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(task_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "Task", id: task_id });
        }
        Ok(())
    }
}
