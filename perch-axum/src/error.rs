use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use perch_core::SwitchError;

/// Transport-side error wrapper.
///
/// Serializes into the same `{success: false, error}` envelope the success
/// path uses, with the status taken from the error taxonomy and the message
/// sanitized for clients. Internals never reach the browser.
#[derive(Debug)]
pub enum PerchAxumError {
    Switch(SwitchError),
    BadRequest(String),
}

impl From<SwitchError> for PerchAxumError {
    fn from(err: SwitchError) -> Self {
        Self::Switch(err)
    }
}

impl IntoResponse for PerchAxumError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PerchAxumError::Switch(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.client_message().to_string())
            }
            PerchAxumError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        };

        let body = json!({
            "success": false,
            "error": message,
        });
        (status, Json(body)).into_response()
    }
}
