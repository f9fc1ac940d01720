//! Blog Store - Document store implementations
//!
//! Implements the `blog_core` store traits for:
//! - [`MemoryStore`]: process-local collections, used for development and tests
//! - [`PgStore`]: PostgreSQL via sqlx, with the author lookup done as a `LEFT JOIN`

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
