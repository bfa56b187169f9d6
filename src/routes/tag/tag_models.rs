use serde::{Deserialize, Serialize};

use crate::models::tag::{CreateTag, UpdateTag};
use crate::validation::{check_color, check_non_empty, check_positive, Validate};

#[derive(Debug, Deserialize)]
pub struct TagQuery {
    #[serde(rename = "pId")]
    pub project_id: Option<i32>,
    #[serde(rename = "tId")]
    pub tag_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub project_id: i32,
    pub name: String,
    pub color: String,
}

impl Validate for CreateTagRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_positive(&mut errors, "project_id", self.project_id);
        check_non_empty(&mut errors, "name", &self.name);
        check_color(&mut errors, &self.color);
        errors
    }
}

impl From<CreateTagRequest> for CreateTag {
    fn from(req: CreateTagRequest) -> Self {
        CreateTag {
            name: req.name.trim().to_string(),
            color: req.color,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Validate for UpdateTagRequest {
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

impl From<UpdateTagRequest> for UpdateTag {
    fn from(req: UpdateTagRequest) -> Self {
        UpdateTag {
            name: req.name.map(|name| name.trim().to_string()),
            color: req.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_colors_accept_short_and_long_hex() {
        for color in ["#F00", "#ff0000"] {
            let req = CreateTagRequest {
                project_id: 2,
                name: "bug".into(),
                color: color.into(),
            };
            assert!(req.validate().is_empty(), "{color}");
        }
    }

    #[test]
    fn update_rejects_blank_name() {
        let req = UpdateTagRequest {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(req.validate(), vec!["name must not be empty".to_string()]);
    }
}
