//! Repository implementations.
//!
//! [`seaorm::SeaOrmStore`] backs production; [`memory::MemoryStore`] mirrors its
//! uniqueness rules in process for tests and local runs.

pub mod memory;
pub mod seaorm;

pub use memory::MemoryStore;
pub use seaorm::SeaOrmStore;
