//! Identity resolution
//!
//! Turns validated claims into the current user record. The stored record
//! is authoritative: flags carried in the token may be stale.

use super::jwt::Claims;
use blog_core::{BlogError, User, UserFilter, UserStore};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Malformed user identifier: {0}")]
    MalformedIdentifier(String),

    #[error("User no longer exists")]
    UserNotFound,

    #[error("User lookup failed: {0}")]
    Store(#[from] BlogError),
}

/// Look up the user named by `claims`
pub async fn resolve(users: &dyn UserStore, claims: &Claims) -> Result<User, ResolveError> {
    let id = Uuid::parse_str(&claims.id)
        .map_err(|_| ResolveError::MalformedIdentifier(claims.id.clone()))?;

    users
        .find_one(&UserFilter::Id(id))
        .await?
        .ok_or(ResolveError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{issue_token, validate_token, JwtConfig};
    use blog_store::MemoryStore;

    #[tokio::test]
    async fn test_resolve_round_trip() {
        let store = MemoryStore::new();
        let user = User::new("alice", None, "Alice", "Liddell");
        UserStore::insert_one(&store, &user).await.unwrap();

        let config = JwtConfig::new("test-secret", 86_400);
        let token = issue_token(&config, &user).unwrap();
        let claims = validate_token(&config, &token).unwrap();

        let resolved = resolve(&store, &claims).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn test_deleted_user_not_found() {
        let store = MemoryStore::new();
        let user = User::new("alice", None, "Alice", "Liddell");
        UserStore::insert_one(&store, &user).await.unwrap();

        let config = JwtConfig::new("test-secret", 86_400);
        let claims = validate_token(&config, &issue_token(&config, &user).unwrap()).unwrap();
        UserStore::delete_one(&store, user.id).await.unwrap();

        let result = resolve(&store, &claims).await;
        assert!(matches!(result, Err(ResolveError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_malformed_identifier() {
        let store = MemoryStore::new();
        let claims = Claims {
            id: "not-a-uuid".to_string(),
            username: "ghost".to_string(),
            admin: false,
            can_publish: false,
            iat: 0,
            exp: 1,
        };

        let result = resolve(&store, &claims).await;
        assert!(matches!(result, Err(ResolveError::MalformedIdentifier(_))));
    }
}
