//! API Integration Tests
//!
//! Every test runs against a fresh in-memory store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use blog_api::{
    create_app, create_router, create_router_for_testing, state::AppState, test_config, App,
};
use blog_core::Post;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper to create a test request
fn create_json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &App, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

async fn register(app: &App, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({
                "username": username,
                "password": password,
                "fname": "Alice",
                "lname": "Liddell"
            })),
        ),
    )
    .await
}

async fn login(app: &App, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        create_json_request(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "username": username, "password": password })),
        ),
    )
    .await
}

/// Register and log in, returning the user id and token
async fn sign_up(app: &App, username: &str) -> (String, String) {
    let (status, _) = register(app, username, "secret1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = login(app, username, "secret1").await;
    assert_eq!(status, StatusCode::OK);

    (
        json["user"]["id"].as_str().unwrap().to_string(),
        json["token"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &App, token: &str, title: &str, published: bool) -> String {
    let (status, json) = send(
        app,
        create_json_request(
            "POST",
            "/api/posts",
            Some(token),
            Some(json!({ "title": title, "text": "Body", "published": published })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["post"]["id"].as_str().unwrap().to_string()
}

fn assert_unauthorized(status: StatusCode, json: &Value) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        *json,
        json!({ "code": "UNAUTHORIZED", "message": "Authentication required" })
    );
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_root_redirects_to_posts() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(response.headers()[header::LOCATION], "/api/posts");
}

#[tokio::test]
async fn test_openapi_document() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/posts"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
}

// =============================================================================
// Registration and Login Tests
// =============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let app = create_router_for_testing();

    let (status, json) = register(&app, "alice", "secret1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["user"]["username"], "alice");
    assert_eq!(json["user"]["admin"], false);
    assert_eq!(json["user"]["canPublish"], false);
    assert!(json["user"].get("password").is_none());

    let (status, json) = login(&app, "alice", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["token"].as_str().unwrap().split('.').count() == 3);
    assert_eq!(json["user"]["username"], "alice");
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = create_router_for_testing();

    let (status, _) = register(&app, "alice", "secret1").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = register(&app, "alice", "another1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_router_for_testing();

    let (status, json) = register(&app, "alice", "short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/users",
            None,
            Some(json!({ "username": "bob", "password": "secret1", "lname": "B" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "First name must be specified.");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("Content-Type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, json) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid request body");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = create_router_for_testing();
    register(&app, "alice", "secret1").await;

    let (wrong_status, wrong_body) = login(&app, "alice", "wrong-password").await;
    let (unknown_status, unknown_body) = login(&app, "nobody", "secret1").await;

    assert_unauthorized(wrong_status, &wrong_body);
    assert_unauthorized(unknown_status, &unknown_body);
}

// =============================================================================
// Access Guard Tests
// =============================================================================

#[tokio::test]
async fn test_current_user_with_token() {
    let app = create_router_for_testing();
    let (user_id, token) = sign_up(&app, "alice").await;

    let (status, json) = send(&app, create_json_request("GET", "/api/users", Some(&token), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], user_id);
    assert_eq!(json["user"]["username"], "alice");
}

#[tokio::test]
async fn test_missing_authorization_header() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/api/users", None, None)).await;
    assert_unauthorized(status, &json);
}

#[tokio::test]
async fn test_wrong_scheme_and_garbage_tokens() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;

    for value in [
        format!("Token {token}"),
        format!("Bearer  {token}"),
        format!("Bearer {token} extra"),
        "Bearer".to_string(),
        "Bearer not.a.jwt".to_string(),
    ] {
        let request = Request::builder()
            .uri("/api/users")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(&app, request).await;
        assert_unauthorized(status, &json);
    }
}

#[tokio::test]
async fn test_token_from_other_server_rejected() {
    let app = create_router_for_testing();
    sign_up(&app, "alice").await;

    // Same username registered on a server with a different secret
    let mut other_config = test_config();
    other_config.auth.jwt_secret = "another-secret".to_string();
    let other = create_app(create_router(Arc::new(AppState::in_memory(other_config))));
    let (_, foreign_token) = sign_up(&other, "alice").await;

    let (status, json) = send(
        &app,
        create_json_request("GET", "/api/users", Some(&foreign_token), None),
    )
    .await;
    assert_unauthorized(status, &json);
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = create_router_for_testing();

    let (status, json) = send(&app, create_json_request("GET", "/api/posts", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"], json!([]));
}

#[tokio::test]
async fn test_trailing_slash_is_ignored() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;
    let id = create_post(&app, &token, "Hello", true).await;

    let (status, json) = send(&app, create_json_request("GET", "/api/posts/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"].as_array().unwrap().len(), 1);

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/posts/{id}/"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["post"]["title"], "Hello");

    let (status, _) = send(
        &app,
        create_json_request("GET", "/api/users/", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Post Tests
// =============================================================================

#[tokio::test]
async fn test_post_lifecycle() {
    let app = create_router_for_testing();
    let (user_id, token) = sign_up(&app, "alice").await;

    let post_id = create_post(&app, &token, "Hello", false).await;

    // Enriched read
    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/posts/{post_id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["post"]["_id"], post_id);
    assert_eq!(json["post"]["title"], "Hello");
    assert_eq!(json["post"]["author"]["_id"], user_id);
    assert_eq!(json["post"]["author"]["username"], "alice");
    assert!(json["post"]["author"].get("password").is_none());

    // PUT
    let (status, json) = send(
        &app,
        create_json_request(
            "PUT",
            &format!("/api/posts/{post_id}"),
            Some(&token),
            Some(json!({ "title": "Hello again" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Post updated");

    // PATCH
    let (status, json) = send(
        &app,
        create_json_request(
            "PATCH",
            &format!("/api/posts/{post_id}"),
            Some(&token),
            Some(json!({ "published": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["updatedPost"]["title"], "Hello again");
    assert_eq!(json["updatedPost"]["published"], true);

    // Author's post list tracks the new post
    let (_, json) = send(&app, create_json_request("GET", "/api/users", Some(&token), None)).await;
    assert_eq!(json["user"]["posts"], json!([post_id]));

    // DELETE
    let (status, json) = send(
        &app,
        create_json_request("DELETE", &format!("/api/posts/{post_id}"), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Post deleted.");
    assert_eq!(json["id"], post_id);

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/posts/{post_id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");

    let (_, json) = send(&app, create_json_request("GET", "/api/users", Some(&token), None)).await;
    assert_eq!(json["user"]["posts"], json!([]));
}

#[tokio::test]
async fn test_create_post_requires_token() {
    let app = create_router_for_testing();

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/posts",
            None,
            Some(json!({ "title": "Hello", "text": "Body" })),
        ),
    )
    .await;
    assert_unauthorized(status, &json);

    let (_, json) = send(&app, create_json_request("GET", "/api/posts", None, None)).await;
    assert_eq!(json["posts"], json!([]));
}

#[tokio::test]
async fn test_create_post_validation() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            "/api/posts",
            Some(&token),
            Some(json!({ "title": "  ", "text": "Body" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Title must be specified.");
}

#[tokio::test]
async fn test_post_not_found_and_invalid_id() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;

    let (status, _) = send(
        &app,
        create_json_request("GET", &format!("/api/posts/{}", Uuid::new_v4()), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, create_json_request("GET", "/api/posts/123", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid post ID");

    let (status, _) = send(
        &app,
        create_json_request(
            "DELETE",
            &format!("/api/posts/{}", Uuid::new_v4()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_posts_split_by_state() {
    let app = create_router_for_testing();
    let (user_id, token) = sign_up(&app, "alice").await;

    let draft = create_post(&app, &token, "Draft", false).await;
    let live = create_post(&app, &token, "Live", true).await;

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/users/{user_id}/posts"), Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["posts"]["published"][0]["id"], live);
    assert_eq!(json["posts"]["unpublished"][0]["id"], draft);
}

#[tokio::test]
async fn test_post_with_deleted_author_has_null_author() {
    let state = Arc::new(AppState::in_memory(test_config()));
    let app = create_app(create_router(state.clone()));

    let orphan = Post::new(Uuid::new_v4(), "Orphan", "Body", None, true);
    state.posts.insert_one(&orphan).await.unwrap();

    let (status, json) = send(
        &app,
        create_json_request("GET", &format!("/api/posts/{}", orphan.id), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["post"]["title"], "Orphan");
    assert!(json["post"]["author"].is_null());

    let (_, json) = send(&app, create_json_request("GET", "/api/posts", None, None)).await;
    assert_eq!(json["posts"].as_array().unwrap().len(), 1);
    assert!(json["posts"][0]["author"].is_null());
}

// =============================================================================
// Comment Tests
// =============================================================================

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = create_router_for_testing();
    let (_, author_token) = sign_up(&app, "alice").await;
    let (reader_id, reader_token) = sign_up(&app, "bob").await;
    let post_id = create_post(&app, &author_token, "Hello", true).await;
    let comments_uri = format!("/api/posts/{post_id}/comments");

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            &comments_uri,
            Some(&reader_token),
            Some(json!({ "text": "Nice post" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comment"]["author"], reader_id);
    let comment_id = json["comment"]["id"].as_str().unwrap().to_string();
    let comment_uri = format!("{comments_uri}/{comment_id}");

    let (status, json) = send(&app, create_json_request("GET", &comments_uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comments"].as_array().unwrap().len(), 1);
    assert_eq!(json["comments"][0]["author"]["username"], "bob");
    assert_eq!(json["comments"][0]["post"], post_id);

    let (status, json) = send(
        &app,
        create_json_request(
            "PATCH",
            &comment_uri,
            Some(&reader_token),
            Some(json!({ "text": "Very nice post" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["updatedComment"]["text"], "Very nice post");

    let (status, json) = send(&app, create_json_request("GET", &comment_uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["comment"]["_id"], comment_id);

    let (status, json) = send(
        &app,
        create_json_request("DELETE", &comment_uri, Some(&reader_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Comment deleted.");

    let (status, _) = send(&app, create_json_request("GET", &comment_uri, None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_on_unknown_post() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/posts/{}/comments", Uuid::new_v4()),
            Some(&token),
            Some(json!({ "text": "Hello?" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_blank_comment_rejected() {
    let app = create_router_for_testing();
    let (_, token) = sign_up(&app, "alice").await;
    let post_id = create_post(&app, &token, "Hello", true).await;

    let (status, json) = send(
        &app,
        create_json_request(
            "POST",
            &format!("/api/posts/{post_id}/comments"),
            Some(&token),
            Some(json!({ "text": "" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Comment must be entered.");
}
