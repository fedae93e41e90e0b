//! Enrollment ledger: one row per (student, course).

pub mod repository;
pub mod service;

pub use service::EnrollmentService;
