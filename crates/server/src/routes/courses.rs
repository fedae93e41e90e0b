use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use common::pagination::{Page, Pagination};
use serde::Deserialize;
use service::auth::domain::AuthUser;
use service::catalog::domain::{CourseInput, CoursePatch, CourseView};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[utoipa::path(get, path = "/api/courses/", tag = "courses",
    params(("page" = Option<u32>, Query, description = "1-based page"), ("page_size" = Option<u32>, Query, description = "items per page, at most 100")),
    responses((status = 200, description = "Active courses, newest first", body = crate::openapi::CoursePageDoc)))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(opts): ApiQuery<Pagination>,
) -> Result<Json<Page<CourseView>>, ApiError> {
    let page = state.services.catalog.list(&user, opts).await?;
    Ok(Json(page.as_ref().clone()))
}

#[utoipa::path(get, path = "/api/courses/search/", tag = "courses",
    params(("q" = String, Query, description = "web-search style query")),
    responses((status = 200, description = "Ranked matches", body = [crate::openapi::CourseDoc]), (status = 400, description = "Missing query")))]
pub async fn search(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<CourseView>>, ApiError> {
    Ok(Json(state.services.catalog.search(&user, query.q.as_deref()).await?))
}

#[utoipa::path(post, path = "/api/courses/", tag = "courses", request_body = crate::openapi::CourseRequest,
    responses((status = 201, description = "Created", body = crate::openapi::CourseDoc), (status = 400, description = "Field errors"), (status = 403, description = "Instructors only")))]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<(StatusCode, Json<CourseView>), ApiError> {
    let created = state.services.catalog.create(&user, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/courses/{id}/", tag = "courses", params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 200, description = "Course", body = crate::openapi::CourseDoc), (status = 404, description = "Not found")))]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<CourseView>, ApiError> {
    Ok(Json(state.services.catalog.get(&user, id).await?))
}

#[utoipa::path(put, path = "/api/courses/{id}/", tag = "courses", params(("id" = Uuid, Path, description = "Course id")), request_body = crate::openapi::CourseRequest,
    responses((status = 200, description = "Replaced", body = crate::openapi::CourseDoc), (status = 403, description = "Not the owner"), (status = 404, description = "Not found")))]
pub async fn replace(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<Json<CourseView>, ApiError> {
    Ok(Json(state.services.catalog.update(&user, id, input.into()).await?))
}

#[utoipa::path(patch, path = "/api/courses/{id}/", tag = "courses", params(("id" = Uuid, Path, description = "Course id")), request_body = crate::openapi::CoursePatchRequest,
    responses((status = 200, description = "Updated", body = crate::openapi::CourseDoc), (status = 403, description = "Not the owner"), (status = 404, description = "Not found")))]
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<CoursePatch>,
) -> Result<Json<CourseView>, ApiError> {
    Ok(Json(state.services.catalog.update(&user, id, changes).await?))
}

#[utoipa::path(delete, path = "/api/courses/{id}/", tag = "courses", params(("id" = Uuid, Path, description = "Course id")),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Not the owner"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.catalog.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
