use axum::{extract::State, http::StatusCode, Extension, Json};
use common::types::Message;
use models::payment;
use service::auth::domain::AuthUser;
use service::payment::PayInput;

use crate::errors::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

#[utoipa::path(post, path = "/api/pay/", tag = "payments", request_body = crate::openapi::PayRequest,
    responses((status = 201, description = "Charged and enrolled", body = crate::openapi::MessageDoc),
        (status = 400, description = "Declined by the gateway, or already enrolled"),
        (status = 404, description = "Course missing or inactive")))]
pub async fn pay(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<PayInput>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    state.services.payments.pay(&user, input).await?;
    Ok((StatusCode::CREATED, Json(Message::new("Payment successful. You are now enrolled."))))
}

#[utoipa::path(get, path = "/api/payments/", tag = "payments",
    responses((status = 200, description = "Caller's payment attempts, newest first", body = [crate::openapi::PaymentDoc])))]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<payment::Model>>, ApiError> {
    Ok(Json(state.services.payments.list(&user).await?))
}
