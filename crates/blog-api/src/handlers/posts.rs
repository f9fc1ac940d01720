//! Post handlers
//!
//! Reads are public and return author-enriched views. Writes require an
//! authenticated user; the author of a new post is always the caller.

use super::{json_body, parse_id};
use crate::auth::CurrentUser;
use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use blog_core::{Post, PostField, PostFilter, PostUpdate, PostWithAuthor, UserUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// New post
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// Partial post update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    /// An empty string clears the image
    pub img_url: Option<String>,
    pub published: Option<bool>,
}

impl UpdatePostRequest {
    fn into_update(self) -> ApiResult<PostUpdate> {
        let mut update = PostUpdate::new();
        if let Some(title) = self.title {
            if title.trim().is_empty() {
                return Err(AppError::BadRequest("Title must be specified.".to_string()));
            }
            update = update.set(PostField::Title(title));
        }
        if let Some(text) = self.text {
            if text.trim().is_empty() {
                return Err(AppError::BadRequest("Text must be specified.".to_string()));
            }
            update = update.set(PostField::Text(text));
        }
        if let Some(url) = self.img_url {
            update = update.set(PostField::ImgUrl(Some(url).filter(|u| !u.is_empty())));
        }
        if let Some(published) = self.published {
            update = update.set(PostField::Published(published));
        }
        Ok(update)
    }
}

/// Publication toggle
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublishRequest {
    pub published: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostWithAuthor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PostResponse {
    pub post: PostWithAuthor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatePostResponse {
    pub success: bool,
    pub post: Post,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub updated_post: PostWithAuthor,
}

/// Plain acknowledgement, optionally naming the affected record
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// List all posts with their authors
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    responses(
        (status = 200, description = "All posts", body = PostListResponse)
    )
)]
pub async fn list_posts(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let posts = state.queries.list_posts_with_author().await?;
    Ok(Json(PostListResponse { posts }))
}

/// Get a post with its author
#[utoipa::path(
    get,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 400, description = "Invalid post ID", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    )
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;
    let post = state.queries.get_post_with_author(post_id).await?;
    Ok(Json(PostResponse { post }))
}

/// Create a post authored by the caller
#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = CreatePostResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(payload)?;
    if request.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title must be specified.".to_string()));
    }
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Text must be specified.".to_string()));
    }

    let post = Post::new(
        user.id,
        request.title,
        request.text,
        request.img_url,
        request.published,
    );
    state.posts.insert_one(&post).await?;
    state
        .users
        .update_one(user.id, UserUpdate::PushPost(post.id))
        .await?;

    tracing::info!(post_id = %post.id, author = %user.id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            success: true,
            post,
        }),
    ))
}

/// Update a post's title, text, image or publication state
#[utoipa::path(
    put,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = MessageResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;
    let update = json_body(payload)?.into_update()?;

    let matched = state.posts.update_one(post_id, &update).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Post".to_string()));
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Post updated".to_string(),
        id: None,
    }))
}

/// Set a post's publication state
#[utoipa::path(
    patch,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Post updated", body = PublishResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn publish_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;
    let request = json_body(payload)?;

    let update = PostUpdate::new().set(PostField::Published(request.published));
    let matched = state.posts.update_one(post_id, &update).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Post".to_string()));
    }

    let updated_post = state.queries.get_post_with_author(post_id).await?;
    Ok(Json(PublishResponse {
        success: true,
        updated_post,
    }))
}

/// Delete a post
#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}",
    tag = "posts",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post deleted", body = MessageResponse),
        (status = 400, description = "Invalid post ID", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;

    let existing = state.posts.find_one(&PostFilter::Id(post_id)).await?;
    let deleted = state.posts.delete_one(post_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Post".to_string()));
    }

    if let Some(post) = existing {
        state
            .users
            .update_one(post.author, UserUpdate::PullPost(post_id))
            .await?;
    }

    tracing::info!(post_id = %post_id, "Post deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "Post deleted.".to_string(),
        id: Some(post_id.to_string()),
    }))
}
