//! Security audit logging for authentication events
//!
//! Registrations, logins and rejected tokens are logged at INFO level under
//! the `audit` target so they can be filtered and routed apart from
//! application logs. Events never carry passwords, hashes or tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: Uuid,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed registration attempt
    RegistrationFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Successful user login
    LoginSuccess {
        user_id: Uuid,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Request rejected by the access guard
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

/// Client metadata attached to audit events
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
pub fn audit_log(event: &AuditEvent) {
    let timestamp = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            user_id,
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?ip_address,
                "Registration successful"
            );
        }
        AuditEvent::RegistrationFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Registration failed"
            );
        }
        AuditEvent::LoginSuccess {
            user_id,
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?ip_address,
                "Login successful"
            );
        }
        AuditEvent::LoginFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "Login failed"
            );
        }
        AuditEvent::InvalidToken {
            ip_address, reason, ..
        } => {
            info!(
                target: "audit",
                timestamp = %timestamp,
                event = %event_json,
                ip_address = ?ip_address,
                reason = %reason,
                "Invalid token"
            );
        }
    }
}

/// Extract the client IP from proxy headers
///
/// Takes the first hop of `X-Forwarded-For`, then `X-Real-IP`.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract the user agent header
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}
