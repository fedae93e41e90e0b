//! Course catalog: listing (cached), ranked search and instructor-owned authoring.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CatalogService;
