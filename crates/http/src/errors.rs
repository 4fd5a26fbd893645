use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use crate::encode::EncodeError;
use crate::templates::TemplateError;

/// JSON error envelope: `{"error": <code>, "message": <message>}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl IntoResponse for TemplateError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "template rendering failed");
        match self {
            TemplateError::NotFound(name) => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "template_not_found",
                format!("template '{name}' is not registered"),
            ),
            other => json_error(StatusCode::INTERNAL_SERVER_ERROR, "template_error", other.to_string()),
        }
    }
}

impl IntoResponse for EncodeError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "response encoding failed");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "encode_error", self.to_string())
    }
}
