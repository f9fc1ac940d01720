//! Document store contract
//!
//! Each collection exposes insert / find / update / delete operations plus,
//! for content collections, a left-outer author lookup. Absence is reported
//! as `Ok(None)` or a zero matched/deleted count, never as an error.

use crate::models::{
    Comment, CommentUpdate, Joined, Post, PostUpdate, User, UserUpdate,
};
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// User lookup filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Id(Uuid),
    Username(String),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Id(id) => user.id == *id,
            UserFilter::Username(name) => user.username == *name,
        }
    }
}

/// Post lookup filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Id(Uuid),
    Author(Uuid),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match *self {
            PostFilter::All => true,
            PostFilter::Id(id) => post.id == id,
            PostFilter::Author(author) => post.author == author,
        }
    }
}

/// Comment lookup filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFilter {
    All,
    Id(Uuid),
    Post(Uuid),
}

impl CommentFilter {
    pub fn matches(&self, comment: &Comment) -> bool {
        match *self {
            CommentFilter::All => true,
            CommentFilter::Id(id) => comment.id == id,
            CommentFilter::Post(post) => comment.post == post,
        }
    }
}

/// User collection operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; fails with `DuplicateUsername` if the name is taken
    async fn insert_one(&self, user: &User) -> Result<()>;

    /// Find a single user
    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>>;

    /// Apply an update, returning the matched count
    async fn update_one(&self, id: Uuid, update: UserUpdate) -> Result<u64>;

    /// Delete a user, returning the deleted count
    async fn delete_one(&self, id: Uuid) -> Result<u64>;
}

/// Post collection operations
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_one(&self, post: &Post) -> Result<()>;

    async fn find_one(&self, filter: &PostFilter) -> Result<Option<Post>>;

    /// Find posts in insertion order
    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>>;

    async fn update_one(&self, id: Uuid, update: &PostUpdate) -> Result<u64>;

    async fn delete_one(&self, id: Uuid) -> Result<u64>;

    /// Left-outer join of matching posts with their author projection
    async fn find_with_author(&self, filter: &PostFilter) -> Result<Vec<Joined<Post>>>;
}

/// Comment collection operations
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_one(&self, comment: &Comment) -> Result<()>;

    async fn find_one(&self, filter: &CommentFilter) -> Result<Option<Comment>>;

    /// Find comments in insertion order
    async fn find(&self, filter: &CommentFilter) -> Result<Vec<Comment>>;

    async fn update_one(&self, id: Uuid, update: &CommentUpdate) -> Result<u64>;

    async fn delete_one(&self, id: Uuid) -> Result<u64>;

    /// Left-outer join of matching comments with their author projection
    async fn find_with_author(&self, filter: &CommentFilter) -> Result<Vec<Joined<Comment>>>;
}
