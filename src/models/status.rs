use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Status {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
}

/// A status as listed in `status_map`, where the key carries the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
}

impl Status {
    pub fn entry(&self) -> StatusEntry {
        StatusEntry {
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
        }
    }
}

impl StatusEntry {
    pub fn with_id(self, id: i32) -> Status {
        Status {
            id,
            name: self.name,
            description: self.description,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateStatus {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateStatus {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl UpdateStatus {
    pub fn apply_to(&self, status: &mut Status) {
        if let Some(name) = &self.name {
            status.name = name.clone();
        }
        if let Some(description) = &self.description {
            status.description = Some(description.clone());
        }
        if let Some(color) = &self.color {
            status.color = color.clone();
        }
    }
}

/// Statuses every new project starts with.
pub fn default_statuses() -> Vec<CreateStatus> {
    [
        ("To Do", "#EB7A34"),
        ("In Progress", "#53B3DB"),
        ("Done", "#58E701"),
    ]
    .into_iter()
    .map(|(name, color)| CreateStatus {
        name: name.to_string(),
        description: Some(name.to_string()),
        color: color.to_string(),
    })
    .collect()
}
