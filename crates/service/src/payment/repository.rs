use async_trait::async_trait;
use models::{enrollment, payment::{self, NewPayment}};
use uuid::Uuid;

use crate::errors::ServiceError;

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record a single attempt on its own (failed charges, reconciliation rows).
    async fn record_payment(&self, payment: NewPayment) -> Result<payment::Model, ServiceError>;
    /// Record a completed payment and the active enrollment it buys, atomically.
    /// An existing enrollment aborts both writes with `ServiceError::Conflict`.
    async fn record_paid_enrollment(&self, payment: NewPayment) -> Result<(payment::Model, enrollment::Model), ServiceError>;
    /// Newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<payment::Model>, ServiceError>;
}
