use async_trait::async_trait;
use models::enrollment::{self, EnrollmentStatus};
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<enrollment::Model>, ServiceError>;
    /// Insert an active enrollment. An existing (student, course) row is `ServiceError::Conflict`.
    async fn create_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<enrollment::Model, ServiceError>;
    async fn set_status(&self, id: Uuid, status: EnrollmentStatus) -> Result<enrollment::Model, ServiceError>;
    /// Newest first
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<enrollment::Model>, ServiceError>;
}
