use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use common::types::Message;
use models::enrollment;
use service::auth::domain::AuthUser;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/courses/{id}/enroll/", tag = "enrollments", params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 201, description = "Enrolled", body = crate::openapi::MessageDoc), (status = 400, description = "Inactive course or already enrolled"), (status = 404, description = "Not found")))]
pub async fn enroll(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    state.services.enrollments.enroll(&user, course_id).await?;
    Ok((StatusCode::CREATED, Json(Message::new("Successfully enrolled."))))
}

#[utoipa::path(post, path = "/api/courses/{id}/drop/", tag = "enrollments", params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 200, description = "Enrollment marked dropped", body = crate::openapi::EnrollmentDoc), (status = 404, description = "Not enrolled")))]
pub async fn drop_enrollment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<Json<enrollment::Model>, ApiError> {
    Ok(Json(state.services.enrollments.withdraw(&user, course_id).await?))
}

#[utoipa::path(get, path = "/api/enrollments/", tag = "enrollments",
    responses((status = 200, description = "Caller's enrollments, newest first", body = [crate::openapi::EnrollmentDoc])))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<enrollment::Model>>, ApiError> {
    Ok(Json(state.services.enrollments.list(&user).await?))
}
