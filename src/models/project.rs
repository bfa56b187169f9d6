use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub members: Vec<i32>,
}

/// Project summary as it travels on the wire.
///
/// The counters are only filled for workspace listings, `members` only for
/// project details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectOverview {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_members: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_tasks: Option<i64>,
    #[serde(default)]
    pub members: Option<Vec<i32>>,
}

impl Project {
    pub fn overview(&self) -> ProjectOverview {
        ProjectOverview {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            num_members: None,
            num_tasks: None,
            members: Some(self.members.clone()),
        }
    }
}

/// Member, status and tag ids of a single project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectScope {
    pub project_id: i32,
    pub members: Vec<i32>,
    pub status_ids: Vec<i32>,
    pub tag_ids: Vec<i32>,
}

impl ProjectScope {
    pub fn is_member(&self, user_id: i32) -> bool {
        self.members.contains(&user_id)
    }

    pub fn has_status(&self, status_id: i32) -> bool {
        self.status_ids.contains(&status_id)
    }

    /// Keeps the tag ids that belong to this project, in request order, without duplicates.
    pub fn filter_tags(&self, ids: &[i32]) -> Vec<i32> {
        retain_known(ids, &self.tag_ids)
    }

    /// Keeps the user ids that are members of this project.
    pub fn filter_members(&self, ids: &[i32]) -> Vec<i32> {
        retain_known(ids, &self.members)
    }
}

fn retain_known(ids: &[i32], known: &[i32]) -> Vec<i32> {
    let mut kept = Vec::with_capacity(ids.len());
    for id in ids {
        if known.contains(id) && !kept.contains(id) {
            kept.push(*id);
        }
    }
    kept
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub created_by: i32,
    pub members: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub members: Option<Vec<i32>>,
}
