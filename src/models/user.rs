use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(rename = "profilePicture", default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

// Never serialized; the hash stays inside the store.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}
