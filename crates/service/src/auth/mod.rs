//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login and opaque bearer tokens live here.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::AuthService;
