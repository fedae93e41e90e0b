//! Course reviews, one per enrolled student.

pub mod repository;
pub mod service;

pub use service::{ReviewInput, ReviewService};
