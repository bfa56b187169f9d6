use serde::{Deserialize, Serialize};

use crate::models::project::{CreateProject, ProjectOverview, UpdateProject};
use crate::validation::{check_non_empty, check_positive, Validate};

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    #[serde(rename = "pId")]
    pub project_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UserProjectsQuery {
    #[serde(rename = "uId")]
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProjectsResponse {
    pub user_id: i32,
    pub projects: Vec<ProjectOverview>,
}

// Project creation; the caller becomes the creator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub members: Vec<i32>,
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_non_empty(&mut errors, "name", &self.name);
        check_non_empty(&mut errors, "description", &self.description);
        for member in &self.members {
            check_positive(&mut errors, "members", *member);
        }
        errors
    }
}

impl CreateProjectRequest {
    pub fn into_create(self, created_by: i32) -> CreateProject {
        CreateProject {
            name: self.name.trim().to_string(),
            description: self.description,
            created_by,
            members: self.members,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<i32>>,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_non_empty(&mut errors, "name", name);
        }
        for member in self.members.iter().flatten() {
            check_positive(&mut errors, "members", *member);
        }
        errors
    }
}

impl From<UpdateProjectRequest> for UpdateProject {
    fn from(req: UpdateProjectRequest) -> Self {
        UpdateProject {
            name: req.name.map(|name| name.trim().to_string()),
            description: req.description,
            members: req.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name_and_description() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name":"","description":"","members":[0]}"#).unwrap();
        assert_eq!(req.validate().len(), 3);
    }

    #[test]
    fn members_default_to_empty() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name":"Launch","description":"Q3"}"#).unwrap();
        assert!(req.validate().is_empty());
        assert_eq!(req.into_create(4).created_by, 4);
    }
}
