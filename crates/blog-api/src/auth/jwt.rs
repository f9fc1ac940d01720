//! JWT token issuing and validation
//!
//! Tokens are compact JWS signed with HMAC-SHA256 over a process-wide
//! secret. Expiry is checked here against an explicit clock instead of by
//! `jsonwebtoken`, so the `*_at` variants can be driven from tests.

use blog_core::{AuthConfig, User};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity assertion embedded in the access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id (hyphenated UUID)
    pub id: String,
    pub username: String,
    pub admin: bool,
    #[serde(rename = "canPublish")]
    pub can_publish: bool,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds), always after `iat`
    pub exp: i64,
}

/// Token issuing and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("Malformed token")]
    Malformed,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token lifetime in seconds (default: 86400 = 24 hours)
    pub expiration_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expiration_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            expiration_secs,
        }
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_secs: config.jwt_expiration_secs,
        }
    }
}

/// Issue an access token for `user`
pub fn issue_token(config: &JwtConfig, user: &User) -> Result<String, JwtError> {
    issue_token_at(config, user, Utc::now())
}

/// Issue an access token as if the current time were `now`
pub fn issue_token_at(
    config: &JwtConfig,
    user: &User,
    now: DateTime<Utc>,
) -> Result<String, JwtError> {
    let iat = now.timestamp();
    let lifetime = i64::try_from(config.expiration_secs).unwrap_or(i64::MAX);

    let claims = Claims {
        id: user.id.to_string(),
        username: user.username.clone(),
        admin: user.admin,
        can_publish: user.can_publish,
        iat,
        exp: iat.saturating_add(lifetime),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a token against the current time
pub fn validate_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    validate_token_at(config, token, Utc::now())
}

/// Validate a token as if the current time were `now`
///
/// Checks run in order: the header algorithm must be in the HMAC family,
/// the signature must verify, and `now` must be strictly before `exp`.
pub fn validate_token_at(
    config: &JwtConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidAlgorithm => JwtError::UnexpectedAlgorithm,
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Malformed,
    })?;

    let claims = token_data.claims;
    if now.timestamp() >= claims.exp {
        return Err(JwtError::Expired);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::Duration;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiration_secs: 24 * 60 * 60,
        }
    }

    fn user() -> User {
        User::new("alice", None, "Alice", "Liddell")
    }

    #[test]
    fn test_issue_and_validate_token() {
        let config = config("s1");
        let user = user();

        let token = issue_token(&config, &user).unwrap();
        let claims = validate_token(&config, &token).unwrap();

        assert_eq!(claims.id, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert!(!claims.admin);
        assert!(!claims.can_publish);
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn test_claims_wire_names() {
        let config = config("s1");
        let token = issue_token(&config, &user()).unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert!(json.get("canPublish").is_some());
        assert!(json.get("can_publish").is_none());
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_token(&config("s2"), &user()).unwrap();
        let result = validate_token(&config("s1"), &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let config = config("s1");
        let token = issue_token(&config, &user()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
        payload["admin"] = serde_json::Value::Bool(true);
        parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).unwrap());
        let forged = parts.join(".");

        let result = validate_token(&config, &forged);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_after_lifetime() {
        let config = config("s1");
        let issued = Utc::now();
        let token = issue_token_at(&config, &user(), issued).unwrap();

        let just_before = issued + Duration::seconds(86_399);
        assert!(validate_token_at(&config, &token, just_before).is_ok());

        let after = issued + Duration::seconds(86_401);
        let result = validate_token_at(&config, &token, after);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_expired_at_exact_instant() {
        let config = config("s1");
        let issued = Utc::now();
        let token = issue_token_at(&config, &user(), issued).unwrap();

        let at_exp = issued + Duration::seconds(86_400);
        let result = validate_token_at(&config, &token, at_exp);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let config = config("s1");
        let token = issue_token(&config, &user()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[0] = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let forged = parts.join(".");

        let result = validate_token(&config, &forged);
        assert!(matches!(result, Err(JwtError::UnexpectedAlgorithm)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let result = validate_token(&config("s1"), "invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed)));

        let result = validate_token(&config("s1"), "");
        assert!(matches!(result, Err(JwtError::Malformed)));
    }
}
