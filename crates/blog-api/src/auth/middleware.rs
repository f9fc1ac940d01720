//! Access guard for protected routes
//!
//! Validates the bearer token from the Authorization header, resolves it to
//! the current user record and hands that record to the handler as
//! [`CurrentUser`]. Every failure renders the same 401 body; the cause is
//! only logged.
use super::jwt::{validate_token, JwtConfig, JwtError};
use super::resolver::{resolve, ResolveError};
use crate::audit::{audit_log, AuditEvent, RequestMeta};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use blog_core::{User, UserStore};
use std::sync::Arc;
use thiserror::Error;

/// The authenticated user, inserted into request extensions by [`require_auth`]
///
/// ```ignore
/// async fn handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Invalid Authorization header format")]
    MalformedCredential,

    #[error("Invalid token: {0}")]
    Token(#[from] JwtError),

    #[error("Unresolvable identity: {0}")]
    Identity(#[from] ResolveError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::Unauthorized.into_response()
    }
}

/// Token validation plus identity resolution
#[derive(Clone)]
pub struct AccessGuard {
    jwt: JwtConfig,
    users: Arc<dyn UserStore>,
}

impl AccessGuard {
    pub fn new(jwt: JwtConfig, users: Arc<dyn UserStore>) -> Self {
        Self { jwt, users }
    }

    /// Authorize a request from its Authorization header value
    pub async fn authorize(&self, authorization: Option<&HeaderValue>) -> Result<User, AuthError> {
        let value = authorization
            .ok_or(AuthError::MissingCredential)?
            .to_str()
            .map_err(|_| AuthError::MalformedCredential)?;

        let token = bearer_token(value)?;
        let claims = validate_token(&self.jwt, token)?;
        let user = resolve(self.users.as_ref(), &claims).await?;

        Ok(user)
    }
}

/// Split `Bearer <token>`; exactly two space-separated parts are accepted
fn bearer_token(value: &str) -> Result<&str, AuthError> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedCredential),
    }
}

/// Route layer guarding the protected routes
///
/// ```ignore
/// let protected = Router::new()
///     .route("/api/posts", post(posts::create_post))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();

    match state.guard.authorize(authorization.as_ref()).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        Err(e) => {
            if let AuthError::Identity(ResolveError::Store(ref store_error)) = e {
                tracing::warn!(error = %store_error, "User lookup failed during authentication");
            } else {
                tracing::debug!(error = %e, "Request rejected");
            }

            let meta = RequestMeta::from_headers(request.headers());
            audit_log(&AuditEvent::InvalidToken {
                ip_address: meta.ip_address,
                user_agent: meta.user_agent,
                reason: e.to_string(),
            });
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{issue_token, issue_token_at};
    use axum::http::StatusCode;
    use blog_store::MemoryStore;
    use chrono::{Duration, Utc};

    async fn setup() -> (AccessGuard, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("alice", None, "Alice", "Liddell");
        UserStore::insert_one(store.as_ref(), &user).await.unwrap();

        let guard = AccessGuard::new(JwtConfig::new("test-secret", 86_400), store.clone());
        (guard, store, user)
    }

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let (guard, _store, user) = setup().await;
        let token = issue_token(&JwtConfig::new("test-secret", 86_400), &user).unwrap();

        let resolved = guard
            .authorize(Some(&header(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (guard, _store, _user) = setup().await;
        let result = guard.authorize(None).await;
        assert!(matches!(result, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_malformed_headers() {
        let (guard, _store, user) = setup().await;
        let token = issue_token(&JwtConfig::new("test-secret", 86_400), &user).unwrap();

        for value in [
            format!("Token {token}"),
            format!("bearer {token}"),
            format!("Bearer {token} extra"),
            format!("Bearer  {token}"),
            "Bearer".to_string(),
            "Bearer ".to_string(),
            token.clone(),
        ] {
            let result = guard.authorize(Some(&header(&value))).await;
            assert!(
                matches!(result, Err(AuthError::MalformedCredential)),
                "expected malformed credential for {value:?}"
            );
        }

        let non_utf8 = HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap();
        let result = guard.authorize(Some(&non_utf8)).await;
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (guard, _store, user) = setup().await;
        let issued = Utc::now() - Duration::hours(25);
        let token = issue_token_at(&JwtConfig::new("test-secret", 86_400), &user, issued).unwrap();

        let result = guard.authorize(Some(&header(&format!("Bearer {token}")))).await;
        assert!(matches!(result, Err(AuthError::Token(JwtError::Expired))));
    }

    #[tokio::test]
    async fn test_token_for_deleted_user() {
        let (guard, store, user) = setup().await;
        let token = issue_token(&JwtConfig::new("test-secret", 86_400), &user).unwrap();
        UserStore::delete_one(store.as_ref(), user.id).await.unwrap();

        let result = guard.authorize(Some(&header(&format!("Bearer {token}")))).await;
        assert!(matches!(
            result,
            Err(AuthError::Identity(ResolveError::UserNotFound))
        ));
    }

    #[tokio::test]
    async fn test_every_failure_renders_same_body() {
        let failures = [
            AuthError::MissingCredential,
            AuthError::MalformedCredential,
            AuthError::Token(JwtError::Expired),
            AuthError::Identity(ResolveError::UserNotFound),
        ];

        for failure in failures {
            let response = failure.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(
                json,
                serde_json::json!({"code": "UNAUTHORIZED", "message": "Authentication required"})
            );
        }
    }
}
