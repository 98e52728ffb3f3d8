use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

/// Failure kinds surfaced by the service layer.
///
/// Every core operation is all-or-nothing at single-operation granularity:
/// an error here means no ledger entry was posted and no order field changed
/// for the failing call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attempted status change not permitted from the current stage for the
    /// actor's role. The order is unchanged.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// PIN mismatch on cash handover, or a role lacking permission for an
    /// action.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Operation is well-formed but not applicable to the entity's state
    /// (e.g. settling an already-paid order).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidTransition(_) => StatusCode::CONFLICT,
            ServiceError::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidOperation(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        }));
        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::Unauthorized("pin".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ServiceError::InvalidTransition("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::InsufficientFunds("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
