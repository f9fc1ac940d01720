//! Authentication service layer
//!
//! Registration, password login and the current-user profile. Storage goes
//! through the [`UserStore`] contract so the same logic runs against the
//! in-memory and PostgreSQL stores.

use super::jwt::{issue_token, JwtConfig};
use super::password::{hash_password_with_config, validate_password, verify_password, PasswordConfig};
use crate::error::AppError;
use blog_core::{BlogError, Credential, User, UserFilter, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registered user as returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub fname: String,
    pub admin: bool,
    pub can_publish: bool,
}

/// Authenticated user as returned by login and the current-user endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub fname: String,
    pub admin: bool,
    pub can_publish: bool,
    pub posts: Vec<Uuid>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            fname: user.fname.clone(),
            admin: user.admin,
            can_publish: user.can_publish,
        }
    }
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            fname: user.fname.clone(),
            admin: user.admin,
            can_publish: user.can_publish,
            posts: user.posts.clone(),
        }
    }
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

/// Why a login was refused; never shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    UnknownUser,
    NoLocalCredential,
    WrongPassword,
}

impl LoginFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            LoginFailure::UnknownUser => "User does not exist",
            LoginFailure::NoLocalCredential => "Account has no local password",
            LoginFailure::WrongPassword => "Password does not match",
        }
    }
}

/// Outcome of a login attempt
#[derive(Debug)]
pub enum LoginOutcome {
    Success { user: User, token: String },
    Refused(LoginFailure),
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt: JwtConfig,
    password: PasswordConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtConfig, password: PasswordConfig) -> Self {
        Self {
            users,
            jwt,
            password,
        }
    }

    /// Register a new non-privileged user
    ///
    /// * `Err(BadRequest)` - a name is blank or the password is too short
    /// * `Err(Conflict)` - the username is taken
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        validate_registration(&request)?;

        let existing = self
            .users
            .find_one(&UserFilter::Username(request.username.clone()))
            .await?;
        if existing.is_some() {
            return Err(BlogError::DuplicateUsername(request.username).into());
        }

        let hash = hash_password_with_config(&request.password, &self.password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

        let user = User::new(
            request.username,
            Some(Credential::new(hash)),
            request.fname,
            request.lname,
        );

        // A concurrent registration that slipped past the pre-check is
        // rejected here by the store's uniqueness guarantee.
        self.users.insert_one(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check a username/password pair and issue a token on success
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, AppError> {
        let Some(user) = self
            .users
            .find_one(&UserFilter::Username(request.username.clone()))
            .await?
        else {
            return Ok(LoginOutcome::Refused(LoginFailure::UnknownUser));
        };

        let Some(credential) = user.credential.as_ref() else {
            return Ok(LoginOutcome::Refused(LoginFailure::NoLocalCredential));
        };

        let matches = verify_password(&request.password, credential.as_str())
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))?;
        if !matches {
            return Ok(LoginOutcome::Refused(LoginFailure::WrongPassword));
        }

        let token = issue_token(&self.jwt, &user)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {e}")))?;

        Ok(LoginOutcome::Success { user, token })
    }
}

fn validate_registration(request: &RegisterRequest) -> Result<(), AppError> {
    if request.fname.trim().is_empty() {
        return Err(AppError::BadRequest("First name must be specified.".to_string()));
    }
    if request.lname.trim().is_empty() {
        return Err(AppError::BadRequest("Last name must be specified.".to_string()));
    }
    if request.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must be specified.".to_string()));
    }
    validate_password(&request.password).map_err(AppError::BadRequest)?;
    Ok(())
}
