//! Blog Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the blog backend:
//! - Users, posts and comments with their author-joined read views
//! - Closed partial-update enumerations for each entity
//! - Common error types
//! - The document store contract consumed by the API layer
//! - Author-enriched query composition
//! - Configuration management

pub mod config;
pub mod enriched;
pub mod models;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig};
pub use enriched::EnrichedQueries;
pub use models::{
    AuthorRecord, AuthorView, Comment, CommentField, CommentUpdate, CommentWithAuthor, Credential,
    Joined, Post, PostField, PostUpdate, PostWithAuthor, User, UserProfile, UserUpdate,
};
pub use store::{CommentFilter, CommentStore, PostFilter, PostStore, UserFilter, UserStore};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for blog operations
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Username is already taken: {0}")]
    DuplicateUsername(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BlogError>;
