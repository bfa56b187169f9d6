use serde::{Deserialize, Serialize};

use crate::models::status::{CreateStatus, UpdateStatus};
use crate::validation::{check_color, check_non_empty, check_positive, Validate};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "pId")]
    pub project_id: Option<i32>,
    #[serde(rename = "sId")]
    pub status_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStatusRequest {
    pub project_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
}

impl Validate for CreateStatusRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_positive(&mut errors, "project_id", self.project_id);
        check_non_empty(&mut errors, "name", &self.name);
        check_color(&mut errors, &self.color);
        errors
    }
}

impl From<CreateStatusRequest> for CreateStatus {
    fn from(req: CreateStatusRequest) -> Self {
        CreateStatus {
            name: req.name.trim().to_string(),
            description: req.description,
            color: req.color,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_non_empty(&mut errors, "name", name);
        }
        if let Some(color) = &self.color {
            check_color(&mut errors, color);
        }
        errors
    }
}

impl From<UpdateStatusRequest> for UpdateStatus {
    fn from(req: UpdateStatusRequest) -> Self {
        UpdateStatus {
            name: req.name.map(|name| name.trim().to_string()),
            description: req.description,
            color: req.color,
        }
    }
}
