//! Service layer for the learning platform.
//! - Business rules live here; the HTTP crate only translates requests.
//! - Each domain talks to storage through a repository trait, with SeaORM and
//!   in-memory implementations under [`store`].
//! - Access control is decided by [`access::authorize`] before any work happens.

pub mod errors;
pub mod validation;
pub mod access;
pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod payment;
pub mod review;
pub mod cache;
pub mod mail;
pub mod metrics;
pub mod store;
pub mod container;
#[cfg(test)]
pub mod test_support;

pub use container::{Repositories, Services};
pub use errors::{FieldErrors, ServiceError};
