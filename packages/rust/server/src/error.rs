//! Mapping of [`ScreenlensError`] onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use screenlens_shared::ScreenlensError;

/// Handler error: a [`ScreenlensError`] rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub ScreenlensError);

impl From<ScreenlensError> for ApiError {
    fn from(err: ScreenlensError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScreenlensError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ScreenlensError::UnsupportedMedia { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ScreenlensError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ScreenlensError::Network(_) => StatusCode::BAD_GATEWAY,
            ScreenlensError::Config { .. }
            | ScreenlensError::UpstreamFormat { .. }
            | ScreenlensError::Io { .. }
            | ScreenlensError::Validation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn log_error(error: &ScreenlensError) {
    match error {
        ScreenlensError::BadRequest { message }
        | ScreenlensError::UnsupportedMedia { message }
        | ScreenlensError::PayloadTooLarge { message } => {
            warn!("Rejected upload: {message}");
        }
        ScreenlensError::Config { message } => error!("Server misconfigured: {message}"),
        other => error!("Analysis failed: {other}"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_error(&self.0);
        let status = self.status();

        let body = match self.0 {
            ScreenlensError::Config { message }
            | ScreenlensError::BadRequest { message }
            | ScreenlensError::UnsupportedMedia { message }
            | ScreenlensError::PayloadTooLarge { message } => json!({ "error": message }),
            other => json!({ "error": "Analysis failed", "details": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (ScreenlensError::config("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (ScreenlensError::bad_request("x"), StatusCode::BAD_REQUEST),
            (
                ScreenlensError::unsupported_media("x"),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (
                ScreenlensError::upstream_format("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ScreenlensError::payload_too_large("x"),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (ScreenlensError::Network("x".into()), StatusCode::BAD_GATEWAY),
            (ScreenlensError::validation("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
