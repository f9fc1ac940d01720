//! Comment handlers

use super::posts::MessageResponse;
use super::{json_body, parse_id};
use crate::auth::CurrentUser;
use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Extension, Json,
};
use blog_core::{
    Comment, CommentField, CommentFilter, CommentUpdate, CommentWithAuthor, PostFilter,
    UserUpdate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Comment body for create and update
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentListResponse {
    pub success: bool,
    pub comments: Vec<CommentWithAuthor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: CommentWithAuthor,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCommentResponse {
    pub success: bool,
    pub comment: Comment,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentResponse {
    pub success: bool,
    pub updated_comment: CommentWithAuthor,
}

fn require_text(text: &str) -> ApiResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::BadRequest("Comment must be entered.".to_string()));
    }
    Ok(())
}

/// List the comments on a post with their authors
#[utoipa::path(
    get,
    path = "/api/posts/{post_id}/comments",
    tag = "comments",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Comments", body = CommentListResponse),
        (status = 400, description = "Invalid post ID", body = crate::error::ApiError),
    )
)]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;
    let comments = state.queries.list_comments_with_author(post_id).await?;
    Ok(Json(CommentListResponse {
        success: true,
        comments,
    }))
}

/// Get a comment with its author
#[utoipa::path(
    get,
    path = "/api/posts/{post_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("post_id" = String, Path, description = "Post id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment", body = CommentResponse),
        (status = 400, description = "Invalid comment ID", body = crate::error::ApiError),
        (status = 404, description = "Comment not found", body = crate::error::ApiError),
    )
)]
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path((_post_id, comment_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let comment = state.queries.get_comment_with_author(comment_id).await?;
    Ok(Json(CommentResponse {
        success: true,
        comment,
    }))
}

/// Comment on a post as the caller
#[utoipa::path(
    post,
    path = "/api/posts/{post_id}/comments",
    tag = "comments",
    params(
        ("post_id" = String, Path, description = "Post id")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CreateCommentResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Post not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(post_id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let post_id = parse_id(&post_id, "post")?;
    let request = json_body(payload)?;
    require_text(&request.text)?;

    if state.posts.find_one(&PostFilter::Id(post_id)).await?.is_none() {
        return Err(AppError::NotFound("Post".to_string()));
    }

    let comment = Comment::new(post_id, user.id, request.text);
    state.comments.insert_one(&comment).await?;
    state
        .users
        .update_one(user.id, UserUpdate::PushComment(comment.id))
        .await?;

    tracing::info!(comment_id = %comment.id, post_id = %post_id, author = %user.id, "Comment created");

    Ok(Json(CreateCommentResponse {
        success: true,
        comment,
    }))
}

/// Edit a comment's text
#[utoipa::path(
    patch,
    path = "/api/posts/{post_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("post_id" = String, Path, description = "Post id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = UpdateCommentResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Comment not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path((_post_id, comment_id)): Path<(String, String)>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let request = json_body(payload)?;
    require_text(&request.text)?;

    let update = CommentUpdate::new().set(CommentField::Text(request.text));
    let matched = state.comments.update_one(comment_id, &update).await?;
    if matched == 0 {
        return Err(AppError::NotFound("Comment".to_string()));
    }

    let updated_comment = state.queries.get_comment_with_author(comment_id).await?;
    Ok(Json(UpdateCommentResponse {
        success: true,
        updated_comment,
    }))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/posts/{post_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("post_id" = String, Path, description = "Post id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment deleted", body = MessageResponse),
        (status = 400, description = "Invalid comment ID", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 404, description = "Comment not found", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((_post_id, comment_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let comment_id = parse_id(&comment_id, "comment")?;

    let existing = state.comments.find_one(&CommentFilter::Id(comment_id)).await?;
    let deleted = state.comments.delete_one(comment_id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound("Comment".to_string()));
    }

    if let Some(comment) = existing {
        state
            .users
            .update_one(comment.author, UserUpdate::PullComment(comment_id))
            .await?;
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "Comment deleted.".to_string(),
        id: Some(comment_id.to_string()),
    }))
}
