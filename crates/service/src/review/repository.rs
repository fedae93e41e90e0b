use async_trait::async_trait;
use models::review;
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_review(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<review::Model>, ServiceError>;
    /// A second review for the same pair is `ServiceError::Conflict`.
    async fn create_review(&self, student_id: Uuid, course_id: Uuid, rating: i16, comment: &str) -> Result<review::Model, ServiceError>;
    /// Newest first
    async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<review::Model>, ServiceError>;
}
