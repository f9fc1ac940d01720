//! Domain models for users, posts and comments
//!
//! Stored records use [`Uuid`] identifiers. Read views produced by the
//! enriched queries render identifiers in their external string form and
//! carry a trimmed author sub-record instead of the full [`User`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// ============================================================================
// Users
// ============================================================================

/// Opaque salted password hash (PHC string)
///
/// Deliberately not `Serialize`: a credential never leaves the process
/// except through a store implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// User account record as held by the user store
///
/// Not serializable; use [`UserProfile`] for outward representations.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Identifier assigned by an external identity provider
    pub google_id: Option<String>,
    /// Unique login name
    pub username: String,
    /// Local password credential (absent for provider-only accounts)
    pub credential: Option<Credential>,
    pub fname: String,
    pub lname: String,
    pub admin: bool,
    pub can_publish: bool,
    /// Owned post ids, in creation order
    pub posts: Vec<Uuid>,
    /// Owned comment ids, in creation order
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new non-privileged user with empty post and comment lists
    pub fn new(
        username: impl Into<String>,
        credential: Option<Credential>,
        fname: impl Into<String>,
        lname: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            google_id: None,
            username: username.into(),
            credential,
            fname: fname.into(),
            lname: lname.into(),
            admin: false,
            can_publish: false,
            posts: Vec::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Convert user to public representation (without the credential)
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            fname: self.fname.clone(),
            lname: self.lname.clone(),
            admin: self.admin,
            can_publish: self.can_publish,
            posts: self.posts.clone(),
            created_at: self.created_at,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub fname: String,
    pub lname: String,
    pub admin: bool,
    pub can_publish: bool,
    pub posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Updates applicable to a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserUpdate {
    PushPost(Uuid),
    PullPost(Uuid),
    PushComment(Uuid),
    PullComment(Uuid),
}

impl UserUpdate {
    pub fn apply(&self, user: &mut User) {
        match *self {
            UserUpdate::PushPost(id) => user.posts.push(id),
            UserUpdate::PullPost(id) => user.posts.retain(|p| *p != id),
            UserUpdate::PushComment(id) => user.comments.push(id),
            UserUpdate::PullComment(id) => user.comments.retain(|c| *c != id),
        }
    }
}

// ============================================================================
// Posts and comments
// ============================================================================

/// Blog post record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author: Uuid,
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub published: bool,
    pub timestamp: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author: Uuid,
        title: impl Into<String>,
        text: impl Into<String>,
        img_url: Option<String>,
        published: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            title: title.into(),
            text: text.into(),
            img_url: img_url.filter(|url| !url.is_empty()),
            published,
            timestamp: Utc::now(),
        }
    }
}

/// Comment record attached to a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub post: Uuid,
    pub author: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(post: Uuid, author: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post,
            author,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Partial updates
// ============================================================================

/// A single updatable post field with its new value
#[derive(Debug, Clone, PartialEq)]
pub enum PostField {
    Title(String),
    Text(String),
    ImgUrl(Option<String>),
    Published(bool),
}

impl PostField {
    /// Storage column backing this field
    pub fn column(&self) -> &'static str {
        match self {
            PostField::Title(_) => "title",
            PostField::Text(_) => "body",
            PostField::ImgUrl(_) => "img_url",
            PostField::Published(_) => "published",
        }
    }
}

/// Partial post update; holds at most one value per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostUpdate {
    fields: Vec<PostField>,
}

impl PostUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value for the same field in place
    pub fn set(mut self, field: PostField) -> Self {
        let kind = std::mem::discriminant(&field);
        match self
            .fields
            .iter()
            .position(|existing| std::mem::discriminant(existing) == kind)
        {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(&self) -> &[PostField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn apply(&self, post: &mut Post) {
        for field in &self.fields {
            match field {
                PostField::Title(title) => post.title = title.clone(),
                PostField::Text(text) => post.text = text.clone(),
                PostField::ImgUrl(url) => post.img_url = url.clone(),
                PostField::Published(published) => post.published = *published,
            }
        }
    }
}

/// A single updatable comment field with its new value
#[derive(Debug, Clone, PartialEq)]
pub enum CommentField {
    Text(String),
}

/// Partial comment update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentUpdate {
    fields: Vec<CommentField>,
}

impl CommentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value for the same field
    pub fn set(mut self, field: CommentField) -> Self {
        self.fields
            .retain(|existing| std::mem::discriminant(existing) != std::mem::discriminant(&field));
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[CommentField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn apply(&self, comment: &mut Comment) {
        for field in &self.fields {
            match field {
                CommentField::Text(text) => comment.text = text.clone(),
            }
        }
    }
}

// ============================================================================
// Author-joined views
// ============================================================================

/// Trimmed author projection returned by a store's left-outer lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: Uuid,
    pub username: String,
    pub fname: String,
    pub lname: String,
    pub admin: bool,
    pub can_publish: bool,
}

impl From<&User> for AuthorRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            fname: user.fname.clone(),
            lname: user.lname.clone(),
            admin: user.admin,
            can_publish: user.can_publish,
        }
    }
}

/// A content record joined with its author; `author` is `None` when the
/// referenced user no longer exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<T> {
    pub doc: T,
    pub author: Option<AuthorRecord>,
}

/// Author sub-record as rendered in enriched views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub fname: String,
    pub lname: String,
    pub admin: bool,
    pub can_publish: bool,
}

/// Post joined with its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostWithAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: Option<AuthorView>,
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_url: Option<String>,
    pub published: bool,
    pub timestamp: DateTime<Utc>,
}

/// Comment joined with its author
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommentWithAuthor {
    #[serde(rename = "_id")]
    pub id: String,
    pub post: String,
    pub author: Option<AuthorView>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}
