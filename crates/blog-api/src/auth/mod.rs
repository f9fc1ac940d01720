//! Authentication and authorization
//!
//! - Password hashing with Argon2id
//! - Token issuing and validation
//! - Identity resolution from validated claims
//! - Access guard middleware for protected routes
//! - Authentication service for registration and login

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod service;

pub use jwt::{issue_token, validate_token, Claims, JwtConfig, JwtError};
pub use middleware::{require_auth, AccessGuard, AuthError, CurrentUser};
pub use password::{hash_password, validate_password, verify_password, PasswordConfig, PasswordError};
pub use resolver::{resolve, ResolveError};
pub use service::{
    AuthService, LoginFailure, LoginOutcome, LoginRequest, LoginResponse, RegisterRequest,
    UserInfo, UserSummary,
};
