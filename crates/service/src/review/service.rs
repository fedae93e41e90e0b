use std::sync::Arc;

use models::{enrollment::EnrollmentStatus, review};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::repository::ReviewRepository;
use crate::access::{ensure, Action};
use crate::auth::domain::AuthUser;
use crate::catalog::repository::CourseRepository;
use crate::enrollment::repository::EnrollmentRepository;
use crate::errors::{ServiceError, NON_FIELD};
use crate::validation;

pub const ALREADY_REVIEWED: &str = "You have already reviewed this course.";
pub const NOT_ENROLLED: &str = "You must be actively enrolled in this course to review it.";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "Ensure this value is between 1 and 5."))]
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

pub struct ReviewService {
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    repo: Arc<dyn ReviewRepository>,
}

impl ReviewService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        repo: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self { courses, enrollments, repo }
    }

    #[instrument(skip(self, user, input), fields(user_id = %user.id, rating = input.rating))]
    pub async fn submit(&self, user: &AuthUser, course_id: Uuid, input: ReviewInput) -> Result<review::Model, ServiceError> {
        ensure(user.role, Action::Review)?;
        validation::validate(&input)?;

        self.courses.get(course_id).await?.ok_or_else(|| ServiceError::not_found("Course"))?;
        let enrolled = self.enrollments
            .find_enrollment(user.id, course_id)
            .await?
            .is_some_and(|e| e.status == EnrollmentStatus::Active);
        if !enrolled {
            return Err(ServiceError::invalid(NON_FIELD, NOT_ENROLLED));
        }
        if self.repo.find_review(user.id, course_id).await?.is_some() {
            return Err(ServiceError::invalid(NON_FIELD, ALREADY_REVIEWED));
        }
        let created = match self.repo.create_review(user.id, course_id, input.rating, input.comment.trim()).await {
            Ok(row) => row,
            Err(ServiceError::Conflict(detail)) => {
                warn!(%course_id, %detail, "concurrent review lost the insert");
                return Err(ServiceError::invalid(NON_FIELD, ALREADY_REVIEWED));
            }
            Err(e) => return Err(e),
        };
        info!(review_id = %created.id, %course_id, event = "review_created");
        Ok(created)
    }

    pub async fn list(&self, user: &AuthUser, course_id: Uuid) -> Result<Vec<review::Model>, ServiceError> {
        ensure(user.role, Action::ListReviews)?;
        self.courses.get(course_id).await?.ok_or_else(|| ServiceError::not_found("Course"))?;
        self.repo.list_for_course(course_id).await
    }
}
