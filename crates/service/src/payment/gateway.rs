use std::time::Duration;

use async_trait::async_trait;
use configs::PaymentConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// One charge as sent to the provider. Amounts are integer minor units (cents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub amount_minor: i64,
    pub currency: String,
    /// Client-side card token
    pub source: String,
    pub description: String,
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub transaction_id: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider refused the charge; the message is shown to the payer.
    #[error("{0}")]
    Declined(String),
    #[error("payment gateway unreachable: {0}")]
    Transport(String),
    #[error("unexpected payment gateway response: {0}")]
    Protocol(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError>;
}

/// Stripe-compatible `POST /v1/charges` client.
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeCharge {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    failure_message: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl StripeGateway {
    pub fn new(cfg: &PaymentConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(amount = request.amount_minor, currency = %request.currency))]
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        let url = format!("{}/v1/charges", self.api_base);
        let form = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("source", request.source.clone()),
            ("description", request.description.clone()),
        ];
        let resp = self.client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        debug!(%status, "gateway responded");
        if status.is_success() {
            let charge: StripeCharge = resp.json().await.map_err(|e| GatewayError::Protocol(e.to_string()))?;
            if charge.status.as_deref() == Some("failed") {
                return Err(GatewayError::Declined(
                    charge.failure_message.unwrap_or_else(|| "Your card was declined.".into()),
                ));
            }
            if charge.id.trim().is_empty() {
                return Err(GatewayError::Protocol("charge id missing".into()));
            }
            return Ok(ChargeReceipt { transaction_id: charge.id });
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<StripeErrorBody>(&body).ok().map(|b| b.error);
        if let Some(code) = detail.as_ref().and_then(|d| d.code.as_deref()) {
            debug!(code, "gateway error code");
        }
        let message = detail.and_then(|d| d.message);
        if status.is_client_error() {
            Err(GatewayError::Declined(message.unwrap_or_else(|| format!("charge rejected ({status})"))))
        } else {
            Err(GatewayError::Transport(message.unwrap_or_else(|| format!("gateway returned {status}"))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::{http::{HeaderMap, StatusCode}, routing::post, Form, Json, Router};
    use serde_json::{json, Value};

    async fn fake_charges(headers: HeaderMap, Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer sk_test_fake") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "Invalid API Key provided"}})));
        }
        match form.get("source").map(String::as_str) {
            Some("tok_chargeDeclined") => (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({"error": {"type": "card_error", "code": "card_declined", "message": "Your card was declined."}})),
            ),
            Some("tok_boom") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
            _ => (
                StatusCode::OK,
                Json(json!({"id": format!("ch_{}", form["amount"]), "status": "succeeded", "paid": true})),
            ),
        }
    }

    async fn gateway() -> StripeGateway {
        let app = Router::new().route("/v1/charges", post(fake_charges));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        let cfg = PaymentConfig {
            api_base: format!("http://{addr}"),
            secret_key: "sk_test_fake".into(),
            ..PaymentConfig::default()
        };
        StripeGateway::new(&cfg).unwrap()
    }

    fn request(source: &str) -> ChargeRequest {
        ChargeRequest {
            amount_minor: 4999,
            currency: "usd".into(),
            source: source.into(),
            description: "Payment for Rust".into(),
            idempotency_key: uuid::Uuid::new_v4().to_string(),
        }
    }

    #[tokio::test]
    async fn approved_charge_returns_transaction_id() {
        let receipt = gateway().await.charge(&request("tok_visa")).await.unwrap();
        assert_eq!(receipt.transaction_id, "ch_4999");
    }

    #[tokio::test]
    async fn decline_carries_provider_message() {
        match gateway().await.charge(&request("tok_chargeDeclined")).await {
            Err(GatewayError::Declined(msg)) => assert_eq!(msg, "Your card was declined."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_transport_failures() {
        assert!(matches!(gateway().await.charge(&request("tok_boom")).await, Err(GatewayError::Transport(_))));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_transport_failure() {
        let cfg = PaymentConfig {
            api_base: "http://127.0.0.1:9".into(),
            secret_key: "sk_test_fake".into(),
            timeout_secs: 2,
            ..PaymentConfig::default()
        };
        let gw = StripeGateway::new(&cfg).unwrap();
        assert!(matches!(gw.charge(&request("tok_visa")).await, Err(GatewayError::Transport(_))));
    }
}
