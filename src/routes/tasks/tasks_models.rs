use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::project::ProjectScope;
use crate::models::task::{CreateTask, UpdateTask};
use crate::validation::{check_non_empty, check_positive, Validate};

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    #[serde(rename = "pId")]
    pub project_id: Option<i32>,
    #[serde(rename = "tId")]
    pub task_id: Option<i32>,
    /// Older clients delete with `?id=`.
    pub id: Option<i32>,
}

// Task creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub project_id: i32,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status_id: i32,
    pub priority: i32,
    #[serde(default)]
    pub tag_ids: Vec<i32>,
    #[serde(default)]
    pub assigned_to: Vec<i32>,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_non_empty(&mut errors, "name", &self.name);
        check_positive(&mut errors, "priority", self.priority);
        check_positive(&mut errors, "project_id", self.project_id);
        check_positive(&mut errors, "status_id", self.status_id);
        errors
    }
}

impl CreateTaskRequest {
    /// Drops tags and assignees that are foreign to the project.
    pub fn into_create(self, created_by: i32, scope: &ProjectScope) -> CreateTask {
        CreateTask {
            project_id: self.project_id,
            created_by,
            name: self.name.trim().to_string(),
            content: self.content,
            start_time: self.start_time,
            end_time: self.end_time,
            status_id: self.status_id,
            priority: self.priority,
            tag_ids: scope.filter_tags(&self.tag_ids),
            assigned_to: scope.filter_members(&self.assigned_to),
        }
    }
}

// Partial task update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<i32>>,
}

impl Validate for UpdateTaskRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_non_empty(&mut errors, "name", name);
        }
        if let Some(priority) = self.priority {
            check_positive(&mut errors, "priority", priority);
        }
        errors
    }
}

impl UpdateTaskRequest {
    pub fn into_update(self, scope: &ProjectScope) -> UpdateTask {
        UpdateTask {
            name: self.name.map(|name| name.trim().to_string()),
            content: self.content,
            start_time: self.start_time,
            end_time: self.end_time,
            status_id: self.status_id,
            priority: self.priority,
            tag_ids: self.tag_ids.map(|ids| scope.filter_tags(&ids)),
            assigned_to: self.assigned_to.map(|ids| scope.filter_members(&ids)),
        }
    }
}
