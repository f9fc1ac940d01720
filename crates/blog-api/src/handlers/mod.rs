//! API handlers

pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

use crate::error::{ApiResult, AppError};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use uuid::Uuid;

/// Unwrap a JSON body, turning any rejection into a 400
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected request body");
        AppError::BadRequest("Invalid request body".to_string())
    })
}

/// Parse a path identifier; `what` names it in the 400 message
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {what} ID")))
}
