//! PostgreSQL document store
//!
//! Users, posts and comments live in three tables. Owned post and comment
//! ids are kept as `UUID[]` columns on the user row so the push/pull updates
//! map onto `array_append` / `array_remove`. Author lookups are
//! `LEFT JOIN`s, so content whose author row is gone still comes back.

use async_trait::async_trait;
use blog_core::{
    AuthorRecord, BlogError, Comment, CommentField, CommentFilter, CommentStore, CommentUpdate,
    Credential, DatabaseConfig, Joined, Post, PostField, PostFilter, PostStore, PostUpdate, Result,
    User, UserFilter, UserStore, UserUpdate,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        google_id TEXT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT,
        fname TEXT NOT NULL,
        lname TEXT NOT NULL,
        admin BOOLEAN NOT NULL DEFAULT FALSE,
        can_publish BOOLEAN NOT NULL DEFAULT FALSE,
        posts UUID[] NOT NULL DEFAULT '{}',
        comments UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS posts (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        author UUID NOT NULL,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        img_url TEXT,
        published BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        seq BIGSERIAL,
        id UUID PRIMARY KEY,
        post UUID NOT NULL,
        author UUID NOT NULL,
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post)",
];

const POST_COLUMNS: &str = "p.id, p.author, p.title, p.body, p.img_url, p.published, p.created_at";
const COMMENT_COLUMNS: &str = "c.id, c.post, c.author, c.body, c.created_at";
const AUTHOR_COLUMNS: &str = "u.id AS author_id, u.username AS author_username, \
     u.fname AS author_fname, u.lname AS author_lname, \
     u.admin AS author_admin, u.can_publish AS author_can_publish";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect using the configured URL and pool size
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| BlogError::DatabaseError("DATABASE_URL is not set".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(url)
            .await
            .map_err(|e| BlogError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("initialize schema", e))?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    /// Check connectivity
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("ping database", e))?;
        Ok(())
    }
}

fn db_error(action: &str, e: sqlx::Error) -> BlogError {
    BlogError::DatabaseError(format!("Failed to {action}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    google_id: Option<String>,
    username: String,
    password_hash: Option<String>,
    fname: String,
    lname: String,
    admin: bool,
    can_publish: bool,
    posts: Vec<Uuid>,
    comments: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            google_id: row.google_id,
            username: row.username,
            credential: row.password_hash.map(Credential::new),
            fname: row.fname,
            lname: row.lname,
            admin: row.admin,
            can_publish: row.can_publish,
            posts: row.posts,
            comments: row.comments,
            created_at: row.created_at,
        }
    }
}

/// Author columns of a `LEFT JOIN users`; all `NULL` when the author is gone
#[derive(Debug, FromRow)]
struct AuthorColumns {
    author_id: Option<Uuid>,
    author_username: Option<String>,
    author_fname: Option<String>,
    author_lname: Option<String>,
    author_admin: Option<bool>,
    author_can_publish: Option<bool>,
}

impl AuthorColumns {
    fn into_record(self) -> Option<AuthorRecord> {
        Some(AuthorRecord {
            id: self.author_id?,
            username: self.author_username?,
            fname: self.author_fname.unwrap_or_default(),
            lname: self.author_lname.unwrap_or_default(),
            admin: self.author_admin.unwrap_or(false),
            can_publish: self.author_can_publish.unwrap_or(false),
        })
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: Uuid,
    author: Uuid,
    title: String,
    body: String,
    img_url: Option<String>,
    published: bool,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author: row.author,
            title: row.title,
            text: row.body,
            img_url: row.img_url,
            published: row.published,
            timestamp: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostAuthorRow {
    #[sqlx(flatten)]
    post: PostRow,
    #[sqlx(flatten)]
    author: AuthorColumns,
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: Uuid,
    post: Uuid,
    author: Uuid,
    body: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post: row.post,
            author: row.author,
            text: row.body,
            timestamp: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    #[sqlx(flatten)]
    author: AuthorColumns,
}

// ============================================================================
// Filters
// ============================================================================

fn push_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    match *filter {
        PostFilter::All => {}
        PostFilter::Id(id) => {
            qb.push(" WHERE p.id = ").push_bind(id);
        }
        PostFilter::Author(author) => {
            qb.push(" WHERE p.author = ").push_bind(author);
        }
    }
}

/// `UPDATE posts` with one assignment per field in `update`
fn post_update_query(id: Uuid, update: &PostUpdate) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new("UPDATE posts SET ");
    {
        let mut set = qb.separated(", ");
        for field in update.fields() {
            set.push(field.column());
            set.push_unseparated(" = ");
            match field {
                PostField::Title(value) | PostField::Text(value) => {
                    set.push_bind_unseparated(value.clone());
                }
                PostField::ImgUrl(value) => {
                    set.push_bind_unseparated(value.clone());
                }
                PostField::Published(value) => {
                    set.push_bind_unseparated(*value);
                }
            }
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb
}

fn push_comment_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &CommentFilter) {
    match *filter {
        CommentFilter::All => {}
        CommentFilter::Id(id) => {
            qb.push(" WHERE c.id = ").push_bind(id);
        }
        CommentFilter::Post(post) => {
            qb.push(" WHERE c.post = ").push_bind(post);
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn insert_one(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, google_id, username, password_hash, fname, lname,
                admin, can_publish, posts, comments, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.google_id)
        .bind(&user.username)
        .bind(user.credential.as_ref().map(Credential::as_str))
        .bind(&user.fname)
        .bind(&user.lname)
        .bind(user.admin)
        .bind(user.can_publish)
        .bind(&user.posts)
        .bind(&user.comments)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BlogError::DuplicateUsername(user.username.clone())
            } else {
                db_error("create user", e)
            }
        })?;

        Ok(())
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, google_id, username, password_hash, fname, lname, \
             admin, can_publish, posts, comments, created_at FROM users",
        );
        match filter {
            UserFilter::Id(id) => {
                qb.push(" WHERE id = ").push_bind(*id);
            }
            UserFilter::Username(name) => {
                qb.push(" WHERE username = ").push_bind(name.clone());
            }
        }

        let row = qb
            .build_query_as::<UserRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("get user", e))?;

        Ok(row.map(User::from))
    }

    async fn update_one(&self, id: Uuid, update: UserUpdate) -> Result<u64> {
        let (sql, item) = match update {
            UserUpdate::PushPost(item) => (
                "UPDATE users SET posts = array_append(posts, $2) WHERE id = $1",
                item,
            ),
            UserUpdate::PullPost(item) => (
                "UPDATE users SET posts = array_remove(posts, $2) WHERE id = $1",
                item,
            ),
            UserUpdate::PushComment(item) => (
                "UPDATE users SET comments = array_append(comments, $2) WHERE id = $1",
                item,
            ),
            UserUpdate::PullComment(item) => (
                "UPDATE users SET comments = array_remove(comments, $2) WHERE id = $1",
                item,
            ),
        };

        let result = sqlx::query(sql)
            .bind(id)
            .bind(item)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update user", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete user", e))?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Posts
// ============================================================================

impl PgStore {
    async fn post_exists(&self, id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("check post", e))?;
        Ok(count > 0)
    }

    async fn comment_exists(&self, id: Uuid) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("check comment", e))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_one(&self, post: &Post) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, author, title, body, img_url, published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id)
        .bind(post.author)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.img_url)
        .bind(post.published)
        .bind(post.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create post", e))?;

        Ok(())
    }

    async fn find_one(&self, filter: &PostFilter) -> Result<Option<Post>> {
        Ok(PostStore::find(self, filter).await?.into_iter().next())
    }

    async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts p"));
        push_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.seq");

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list posts", e))?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn update_one(&self, id: Uuid, update: &PostUpdate) -> Result<u64> {
        if update.is_empty() {
            return Ok(u64::from(self.post_exists(id).await?));
        }

        let mut qb = post_update_query(id, update);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update post", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete post", e))?;

        Ok(result.rows_affected())
    }

    async fn find_with_author(&self, filter: &PostFilter) -> Result<Vec<Joined<Post>>> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS}, {AUTHOR_COLUMNS} FROM posts p \
             LEFT JOIN users u ON u.id = p.author"
        ));
        push_post_filter(&mut qb, filter);
        qb.push(" ORDER BY p.seq");

        let rows = qb
            .build_query_as::<PostAuthorRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list posts with author", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Joined {
                doc: Post::from(row.post),
                author: row.author.into_record(),
            })
            .collect())
    }
}

// ============================================================================
// Comments
// ============================================================================

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_one(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post, author, body, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(comment.post)
        .bind(comment.author)
        .bind(&comment.text)
        .bind(comment.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("create comment", e))?;

        Ok(())
    }

    async fn find_one(&self, filter: &CommentFilter) -> Result<Option<Comment>> {
        Ok(CommentStore::find(self, filter).await?.into_iter().next())
    }

    async fn find(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {COMMENT_COLUMNS} FROM comments c"));
        push_comment_filter(&mut qb, filter);
        qb.push(" ORDER BY c.seq");

        let rows = qb
            .build_query_as::<CommentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list comments", e))?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn update_one(&self, id: Uuid, update: &CommentUpdate) -> Result<u64> {
        // Text is the only mutable comment field; the last one wins.
        let text = update.fields().iter().rev().find_map(|field| match field {
            CommentField::Text(text) => Some(text.clone()),
        });

        let Some(text) = text else {
            return Ok(u64::from(self.comment_exists(id).await?));
        };

        let result = sqlx::query("UPDATE comments SET body = $2 WHERE id = $1")
            .bind(id)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update comment", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete comment", e))?;

        Ok(result.rows_affected())
    }

    async fn find_with_author(&self, filter: &CommentFilter) -> Result<Vec<Joined<Comment>>> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {COMMENT_COLUMNS}, {AUTHOR_COLUMNS} FROM comments c \
             LEFT JOIN users u ON u.id = c.author"
        ));
        push_comment_filter(&mut qb, filter);
        qb.push(" ORDER BY c.seq");

        let rows = qb
            .build_query_as::<CommentAuthorRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list comments with author", e))?;

        Ok(rows
            .into_iter()
            .map(|row| Joined {
                doc: Comment::from(row.comment),
                author: row.author.into_record(),
            })
            .collect())
    }
}
