use models::user::{self, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, registrable_role};

/// Registration input; `role` stays a raw string so an unknown value can be reported per field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub username: String,
    #[validate(length(min = 6, message = "Ensure this field has at least 6 characters."))]
    pub password: String,
    #[serde(default)]
    #[validate(custom(function = "registrable_role"))]
    pub role: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
    #[serde(skip_serializing)]
    pub is_active: bool,
}

impl From<user::Model> for AuthUser {
    fn from(u: user::Model) -> Self {
        Self { id: u.id, email: u.email, username: u.username, role: u.role, bio: u.bio, is_active: u.is_active }
    }
}

/// Fields for a user row about to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
}
