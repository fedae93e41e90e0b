//! Payment processing: charge the gateway, then record the attempt.
//!
//! A captured charge and its enrollment are written in one transaction. A
//! declined or unreachable charge leaves a `failed` payment row and no enrollment.

pub mod gateway;
pub mod repository;
pub mod service;

pub use gateway::{ChargeReceipt, ChargeRequest, GatewayError, PaymentGateway, StripeGateway};
pub use service::{PayInput, PaymentReceipt, PaymentService};
