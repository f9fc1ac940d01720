//! Author-enriched read queries
//!
//! Joins posts and comments to their authors at read time using the store's
//! left-outer lookup, then projects each row into its external view shape.
//! A row whose author no longer exists is kept with a `null` author.
//! Nothing is cached; every call re-runs the join.

use crate::models::{
    AuthorRecord, AuthorView, Comment, CommentWithAuthor, Joined, Post, PostWithAuthor,
};
use crate::store::{CommentFilter, CommentStore, PostFilter, PostStore};
use crate::{BlogError, Result};
use std::sync::Arc;
use uuid::Uuid;

impl From<AuthorRecord> for AuthorView {
    fn from(author: AuthorRecord) -> Self {
        Self {
            id: author.id.to_string(),
            username: author.username,
            fname: author.fname,
            lname: author.lname,
            admin: author.admin,
            can_publish: author.can_publish,
        }
    }
}

impl From<Joined<Post>> for PostWithAuthor {
    fn from(row: Joined<Post>) -> Self {
        let post = row.doc;
        Self {
            id: post.id.to_string(),
            author: row.author.map(AuthorView::from),
            title: post.title,
            text: post.text,
            img_url: post.img_url,
            published: post.published,
            timestamp: post.timestamp,
        }
    }
}

impl From<Joined<Comment>> for CommentWithAuthor {
    fn from(row: Joined<Comment>) -> Self {
        let comment = row.doc;
        Self {
            id: comment.id.to_string(),
            post: comment.post.to_string(),
            author: row.author.map(AuthorView::from),
            text: comment.text,
            timestamp: comment.timestamp,
        }
    }
}

/// Composer for author-joined post and comment views
#[derive(Clone)]
pub struct EnrichedQueries {
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

impl EnrichedQueries {
    pub fn new(posts: Arc<dyn PostStore>, comments: Arc<dyn CommentStore>) -> Self {
        Self { posts, comments }
    }

    /// All posts with their authors
    pub async fn list_posts_with_author(&self) -> Result<Vec<PostWithAuthor>> {
        let rows = self.posts.find_with_author(&PostFilter::All).await?;
        Ok(rows.into_iter().map(PostWithAuthor::from).collect())
    }

    /// A single post with its author
    ///
    /// Fails with `NotFound` when no post has the given id.
    pub async fn get_post_with_author(&self, id: Uuid) -> Result<PostWithAuthor> {
        let rows = self.posts.find_with_author(&PostFilter::Id(id)).await?;
        rows.into_iter()
            .next()
            .map(PostWithAuthor::from)
            .ok_or_else(|| BlogError::NotFound("Post".to_string()))
    }

    /// Comments on a post with their authors
    pub async fn list_comments_with_author(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let rows = self
            .comments
            .find_with_author(&CommentFilter::Post(post_id))
            .await?;
        tracing::debug!(post_id = %post_id, count = rows.len(), "Loaded comments with authors");
        Ok(rows.into_iter().map(CommentWithAuthor::from).collect())
    }

    /// A single comment with its author
    ///
    /// Fails with `NotFound` when no comment has the given id.
    pub async fn get_comment_with_author(&self, id: Uuid) -> Result<CommentWithAuthor> {
        let rows = self
            .comments
            .find_with_author(&CommentFilter::Id(id))
            .await?;
        rows.into_iter()
            .next()
            .map(CommentWithAuthor::from)
            .ok_or_else(|| BlogError::NotFound("Comment".to_string()))
    }
}
