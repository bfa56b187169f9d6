use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub created_by: i32,
    pub name: String,
    pub content: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_id: i32,
    pub priority: i32,
    #[sqlx(skip)]
    pub tag_ids: Vec<i32>,
    #[sqlx(skip)]
    pub assigned_to: Vec<i32>,
}

/// A task ready to be stored. Tag and assignee ids are already scoped to the project.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: i32,
    pub created_by: i32,
    pub name: String,
    pub content: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status_id: i32,
    pub priority: i32,
    pub tag_ids: Vec<i32>,
    pub assigned_to: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub content: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status_id: Option<i32>,
    pub priority: Option<i32>,
    pub tag_ids: Option<Vec<i32>>,
    pub assigned_to: Option<Vec<i32>>,
}

impl UpdateTask {
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(content) = &self.content {
            task.content = content.clone();
        }
        if let Some(start_time) = self.start_time {
            task.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            task.end_time = end_time;
        }
        if let Some(status_id) = self.status_id {
            task.status_id = status_id;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(tag_ids) = &self.tag_ids {
            task.tag_ids = tag_ids.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            task.assigned_to = assigned_to.clone();
        }
    }
}
