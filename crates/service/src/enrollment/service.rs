use std::sync::Arc;

use models::enrollment::{self, EnrollmentStatus};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repository::EnrollmentRepository;
use crate::access::{ensure, Action};
use crate::auth::domain::AuthUser;
use crate::catalog::repository::CourseRepository;
use crate::errors::{ServiceError, NON_FIELD};
use crate::metrics::ENROLLMENTS_CREATED_TOTAL;

pub const ALREADY_ENROLLED: &str = "You are already enrolled in this course.";
pub const COURSE_INACTIVE: &str = "This course is inactive.";

pub fn already_enrolled() -> ServiceError { ServiceError::invalid(NON_FIELD, ALREADY_ENROLLED) }

pub struct EnrollmentService {
    courses: Arc<dyn CourseRepository>,
    repo: Arc<dyn EnrollmentRepository>,
}

impl EnrollmentService {
    pub fn new(courses: Arc<dyn CourseRepository>, repo: Arc<dyn EnrollmentRepository>) -> Self {
        Self { courses, repo }
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn enroll(&self, user: &AuthUser, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        ensure(user.role, Action::Enroll)?;
        let course = self.courses.get(course_id).await?.ok_or_else(|| ServiceError::not_found("Course"))?;
        if !course.is_active {
            return Err(ServiceError::invalid(NON_FIELD, COURSE_INACTIVE));
        }
        if self.repo.find_enrollment(user.id, course_id).await?.is_some() {
            return Err(already_enrolled());
        }
        let created = match self.repo.create_enrollment(user.id, course_id).await {
            Ok(row) => row,
            Err(ServiceError::Conflict(detail)) => {
                warn!(%course_id, %detail, "concurrent enrollment lost the insert");
                return Err(already_enrolled());
            }
            Err(e) => return Err(e),
        };
        ENROLLMENTS_CREATED_TOTAL.inc();
        info!(enrollment_id = %created.id, %course_id, event = "enrollment_created");
        Ok(created)
    }

    /// Mark the caller's enrollment as dropped. The original enrollment date is kept.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn withdraw(&self, user: &AuthUser, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        ensure(user.role, Action::DropEnrollment)?;
        let existing = self.repo
            .find_enrollment(user.id, course_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Enrollment"))?;
        let dropped = self.repo.set_status(existing.id, EnrollmentStatus::Dropped).await?;
        info!(enrollment_id = %dropped.id, %course_id, event = "enrollment_dropped");
        Ok(dropped)
    }

    pub async fn list(&self, user: &AuthUser) -> Result<Vec<enrollment::Model>, ServiceError> {
        ensure(user.role, Action::ListEnrollments)?;
        self.repo.list_for_student(user.id).await
    }
}
