use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewUser};
use crate::errors::ServiceError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError>;

    /// Create the user and its credentials together. A taken email is `ServiceError::Conflict`.
    async fn create_user(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<AuthUser, ServiceError>;
    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError>;

    /// Existing token for the user, or `fresh_key` stored as the new one.
    async fn issue_token(&self, user_id: Uuid, fresh_key: String) -> Result<String, ServiceError>;
    async fn find_user_by_token(&self, key: &str) -> Result<Option<AuthUser>, ServiceError>;
    /// Returns whether a token existed.
    async fn revoke_token(&self, user_id: Uuid) -> Result<bool, ServiceError>;
}
