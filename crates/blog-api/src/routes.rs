//! API route definitions

use crate::auth::require_auth;
use crate::handlers::{comments, health, posts, users};
use crate::state::AppState;
use axum::{
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document for the blog API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog API",
        description = "Blog backend with token authentication and author-enriched queries"
    ),
    paths(
        health::health_check,
        users::register_handler,
        users::login_handler,
        users::current_user_handler,
        users::user_posts_handler,
        posts::list_posts,
        posts::get_post,
        posts::create_post,
        posts::update_post,
        posts::publish_post,
        posts::delete_post,
        comments::list_comments,
        comments::get_comment,
        comments::create_comment,
        comments::update_comment,
        comments::delete_comment,
    ),
    components(schemas(
        crate::error::ApiError,
        health::HealthResponse,
        crate::auth::RegisterRequest,
        crate::auth::LoginRequest,
        crate::auth::LoginResponse,
        crate::auth::UserSummary,
        crate::auth::UserInfo,
        users::RegisterResponse,
        users::CurrentUserResponse,
        users::PostsByState,
        users::UserPostsResponse,
        posts::CreatePostRequest,
        posts::UpdatePostRequest,
        posts::PublishRequest,
        posts::PostListResponse,
        posts::PostResponse,
        posts::CreatePostResponse,
        posts::PublishResponse,
        posts::MessageResponse,
        comments::CommentRequest,
        comments::CommentListResponse,
        comments::CommentResponse,
        comments::CreateCommentResponse,
        comments::UpdateCommentResponse,
        blog_core::Post,
        blog_core::Comment,
        blog_core::AuthorView,
        blog_core::PostWithAuthor,
        blog_core::CommentWithAuthor,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "users", description = "Registration, login and profiles"),
        (name = "posts", description = "Blog posts"),
        (name = "comments", description = "Comments on posts"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn redirect_to_posts() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/api/posts")])
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the `/api` routes
///
/// Protected routes sit behind `require_auth`; a failed check answers 401
/// before the handler runs.
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/users", post(users::register_handler))
        .route("/users/login", post(users::login_handler))
        .route("/posts", get(posts::list_posts))
        .route("/posts/:post_id", get(posts::get_post))
        .route("/posts/:post_id/comments", get(comments::list_comments))
        .route(
            "/posts/:post_id/comments/:comment_id",
            get(comments::get_comment),
        );

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/users", get(users::current_user_handler))
        .route("/users/:user_id/posts", get(users::user_posts_handler))
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/:post_id",
            axum::routing::put(posts::update_post)
                .patch(posts::publish_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:post_id/comments", post(comments::create_comment))
        .route(
            "/posts/:post_id/comments/:comment_id",
            axum::routing::patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Top-level routes: redirect, health, OpenAPI and `/api`
pub fn app_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(redirect_to_posts))
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", api_routes(state))
}
