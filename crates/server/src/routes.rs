use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use common::types::Health;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::metrics;
use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod auth;
pub mod courses;
pub mod enrollments;
pub mod payments;
pub mod reviews;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Liveness", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public routes, token-protected API and docs
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    // Public routes (health, metrics, credentials exchange)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics))
        .route("/api/register/", post(auth::register))
        .route("/api/login/", post(auth::login));

    // Everything else requires a valid token
    let api = Router::new()
        .route("/api/logout/", post(auth::logout))
        .route("/api/me/", get(auth::me))
        .route("/api/courses/", get(courses::list).post(courses::create))
        .route("/api/courses/search/", get(courses::search))
        .route(
            "/api/courses/:id/",
            get(courses::get).put(courses::replace).patch(courses::patch).delete(courses::delete),
        )
        .route("/api/courses/:id/enroll/", post(enrollments::enroll))
        .route("/api/courses/:id/drop/", post(enrollments::drop_enrollment))
        .route("/api/courses/:id/reviews/", get(reviews::list).post(reviews::submit))
        .route("/api/enrollments/", get(enrollments::list))
        .route("/api/pay/", post(payments::pay))
        .route("/api/payments/", get(payments::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_token));

    public
        .merge(api)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(middleware::from_fn(metrics::track))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request, method and path only
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status code and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and transport failures
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
