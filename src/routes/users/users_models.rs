use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::validation::{check_email, check_non_empty, check_password, Validate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(rename = "uId")]
    pub user_id: Option<i32>,
}

// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_non_empty(&mut errors, "name", name);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(password) = &self.password {
            check_password(&mut errors, password);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provided_fields_are_checked() {
        assert!(UpdateUserRequest::default().validate().is_empty());

        let req = UpdateUserRequest {
            password: Some("1234567".into()),
            ..Default::default()
        };
        assert_eq!(req.validate().len(), 1);
    }
}
