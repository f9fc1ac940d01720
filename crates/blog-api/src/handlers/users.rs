//! User handlers
//!
//! Registration, login, the current-user profile and a user's posts.

use super::{json_body, parse_id};
use crate::audit::{audit_log, AuditEvent, RequestMeta};
use crate::auth::{
    CurrentUser, LoginOutcome, LoginRequest, LoginResponse, RegisterRequest, UserInfo,
    UserSummary,
};
use crate::error::{ApiResult, AppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use blog_core::{Post, PostFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

/// Current user response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub success: bool,
    pub user: UserInfo,
}

/// A user's posts split by publication state
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PostsByState {
    pub published: Vec<Post>,
    pub unpublished: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserPostsResponse {
    pub success: bool,
    pub posts: PostsByState,
}

/// Register a new user account
///
/// New users are neither admins nor publishers. The password is stored as
/// an Argon2id hash and never returned.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = RegisterResponse),
        (status = 400, description = "Invalid input", body = crate::error::ApiError),
        (status = 409, description = "Username is already taken", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let meta = RequestMeta::from_headers(&headers);
    let username = request.username.clone();

    let user = match state.auth.register(request).await {
        Ok(user) => user,
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                username,
                reason: e.to_string(),
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            });
            return Err(e);
        }
    };

    audit_log(&AuditEvent::RegistrationSuccess {
        user_id: user.id,
        username: user.username.clone(),
        ip_address: meta.ip_address,
        user_agent: meta.user_agent,
    });

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User created successfully".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// Login with username and password
///
/// Unknown users and wrong passwords get the same 401.
#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = json_body(payload)?;
    let meta = RequestMeta::from_headers(&headers);

    match state.auth.login(&request).await? {
        LoginOutcome::Success { user, token } => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: user.id,
                username: user.username.clone(),
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            });

            Ok(Json(LoginResponse {
                success: true,
                message: "Logged in successfully".to_string(),
                token,
                user: UserInfo::from(&user),
            }))
        }
        LoginOutcome::Refused(failure) => {
            audit_log(&AuditEvent::LoginFailure {
                username: request.username,
                reason: failure.reason().to_string(),
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
            });
            Err(AppError::Unauthorized)
        }
    }
}

/// Get the authenticated user
///
/// Doubles as a token check for clients.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn current_user_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> impl IntoResponse {
    Json(CurrentUserResponse {
        success: true,
        user: UserInfo::from(&user),
    })
}

/// List a user's posts, split into published and unpublished
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/posts",
    tag = "users",
    params(
        ("user_id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User posts", body = UserPostsResponse),
        (status = 400, description = "Invalid user ID", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn user_posts_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_id(&user_id, "user")?;
    let posts = state.posts.find(&PostFilter::Author(user_id)).await?;

    let (published, unpublished) = posts.into_iter().partition(|post| post.published);

    Ok(Json(UserPostsResponse {
        success: true,
        posts: PostsByState {
            published,
            unpublished,
        },
    }))
}
