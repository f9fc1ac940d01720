//! In-memory document store
//!
//! Collections are vectors kept in insertion order behind tokio `RwLock`s.
//! Every operation is atomic per collection, which is all the API layer
//! relies on.

use async_trait::async_trait;
use blog_core::{
    AuthorRecord, BlogError, Comment, CommentFilter, CommentStore, CommentUpdate, Joined, Post,
    PostFilter, PostStore, PostUpdate, Result, User, UserFilter, UserStore, UserUpdate,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store for users, posts and comments
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Left-outer lookup of an author by id
    async fn lookup_author(&self, id: Uuid) -> Option<AuthorRecord> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .map(AuthorRecord::from)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_one(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(BlogError::DuplicateUsername(user.username.clone()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| filter.matches(u))
            .cloned())
    }

    async fn update_one(&self, id: Uuid, update: UserUpdate) -> Result<u64> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                update.apply(user);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_one(&self, post: &Post) -> Result<()> {
        self.posts.write().await.push(post.clone());
        Ok(())
    }

    async fn find_one(&self, filter: &PostFilter) -> Result<Option<Post>> {
        Ok(self
            .posts
            .read()
            .await
            .iter()
            .find(|p| filter.matches(p))
            .cloned())
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        Ok(self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_one(&self, id: Uuid, update: &PostUpdate) -> Result<u64> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| p.id == id) {
            Some(post) => {
                update.apply(post);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok((before - posts.len()) as u64)
    }

    async fn find_with_author(&self, filter: &PostFilter) -> Result<Vec<Joined<Post>>> {
        let posts = PostStore::find(self, filter).await?;
        let mut rows = Vec::with_capacity(posts.len());
        for doc in posts {
            let author = self.lookup_author(doc.author).await;
            rows.push(Joined { doc, author });
        }
        Ok(rows)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_one(&self, comment: &Comment) -> Result<()> {
        self.comments.write().await.push(comment.clone());
        Ok(())
    }

    async fn find_one(&self, filter: &CommentFilter) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .find(|c| filter.matches(c))
            .cloned())
    }

    async fn find(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn update_one(&self, id: Uuid, update: &CommentUpdate) -> Result<u64> {
        let mut comments = self.comments.write().await;
        match comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                update.apply(comment);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let mut comments = self.comments.write().await;
        let before = comments.len();
        comments.retain(|c| c.id != id);
        Ok((before - comments.len()) as u64)
    }

    async fn find_with_author(&self, filter: &CommentFilter) -> Result<Vec<Joined<Comment>>> {
        let comments = CommentStore::find(self, filter).await?;
        let mut rows = Vec::with_capacity(comments.len());
        for doc in comments {
            let author = self.lookup_author(doc.author).await;
            rows.push(Joined { doc, author });
        }
        Ok(rows)
    }
}
