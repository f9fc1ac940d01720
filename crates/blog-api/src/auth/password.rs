/// Password hashing and verification using Argon2id
///
/// Hashes are PHC strings carrying algorithm, parameters and a random
/// 16-byte salt, so verification needs nothing but the stored string.
/// Cost parameters come from [`AuthConfig`](blog_core::AuthConfig).
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use blog_core::AuthConfig;
use thiserror::Error;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19 MiB)
    pub memory_cost: u32,
    /// Iterations (default: 2)
    pub time_cost: u32,
    /// Lanes (default: 1)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.password_memory_kib,
            time_cost: config.password_time_cost,
            parallelism: config.password_parallelism,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password with the default cost parameters
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with explicit cost parameters
///
/// Returns a PHC string such as `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`.
/// Fails only when the parameters are rejected by argon2 or salt generation
/// fails.
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// * `Ok(true)` - password matches
/// * `Ok(false)` - password does not match
/// * `Err(InvalidHashFormat)` - the stored string is not a PHC hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters are read from the PHC string itself.
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Check the registration password rule
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    Ok(())
}
