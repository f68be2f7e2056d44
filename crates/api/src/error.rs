//! HTTP error envelope.
//!
//! All failures surface as `{ok: false, error: <stable code>}` with a status
//! from the taxonomy: validation 400, precondition conflicts 409, not-found
//! 404, security 401, duplicates 400, infrastructure 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stakehub_core::CoreError;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str) -> Self {
        ApiError { status, code }
    }

    pub fn unauthorized() -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn invalid_payload() -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "invalid_payload")
    }

    pub fn not_found() -> Self {
        ApiError::new(StatusCode::NOT_FOUND, "not_found")
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvalidTier(_)
            | CoreError::AmountOutOfRange { .. }
            | CoreError::InsufficientBalance { .. }
            | CoreError::AlreadyProcessed(_)
            | CoreError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            CoreError::AlreadyFounder
            | CoreError::AlreadyJoined
            | CoreError::SessionClosed
            | CoreError::AccountExists(_)
            | CoreError::StakeNotActive(_) => StatusCode::CONFLICT,
            CoreError::SessionNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::StakeNotFound(_) => StatusCode::NOT_FOUND,
            CoreError::InvalidSignature => StatusCode::UNAUTHORIZED,
            CoreError::SponsorMissing(_) | CoreError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            error!(%err, "operation failed");
        } else {
            warn!(%err, code = err.code(), "request rejected");
        }
        ApiError {
            status,
            code: err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "ok": false, "error": self.code }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakehub_core::types::BalanceField;

    #[test]
    fn status_mapping_follows_taxonomy() {
        let e: ApiError = CoreError::AlreadyFounder.into();
        assert_eq!(e.status, StatusCode::CONFLICT);
        assert_eq!(e.code, "already_founder");

        let e: ApiError = CoreError::InvalidSignature.into();
        assert_eq!(e.status, StatusCode::UNAUTHORIZED);

        let e: ApiError = CoreError::InsufficientBalance {
            field: BalanceField::Trading,
        }
        .into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.code, "insufficient_trading_balance");

        let e: ApiError = CoreError::UserNotFound("u".into()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
    }
}
