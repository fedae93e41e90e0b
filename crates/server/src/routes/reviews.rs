use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use models::review;
use service::auth::domain::AuthUser;
use service::review::ReviewInput;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[utoipa::path(get, path = "/api/courses/{id}/reviews/", tag = "reviews", params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 200, description = "Reviews, newest first", body = [crate::openapi::ReviewDoc]), (status = 404, description = "Not found")))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(course_id): ApiPath<Uuid>,
) -> Result<Json<Vec<review::Model>>, ApiError> {
    Ok(Json(state.services.reviews.list(&user, course_id).await?))
}

#[utoipa::path(post, path = "/api/courses/{id}/reviews/", tag = "reviews", params(("id" = Uuid, Path, description = "Course id")), request_body = crate::openapi::ReviewRequest,
    responses((status = 201, description = "Created", body = crate::openapi::ReviewDoc), (status = 400, description = "Not enrolled, already reviewed or bad rating"), (status = 404, description = "Not found")))]
pub async fn submit(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(course_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<review::Model>), ApiError> {
    let created = state.services.reviews.submit(&user, course_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
