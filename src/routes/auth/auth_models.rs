use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::validation::{check_email, check_non_empty, check_password, Validate};

// Login request and response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password must not be empty".to_string());
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// Registration request; also the body of POST /api/users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_non_empty(&mut errors, "name", &self.name);
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors
    }
}
