use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        let code = self.code();
        match self {
            AppError::Validation(msg) => error_resp(StatusCode::BAD_REQUEST, code, msg),
            AppError::NotFound(msg) => error_resp(StatusCode::NOT_FOUND, code, msg),
            AppError::Conflict(msg) => error_resp(StatusCode::CONFLICT, code, msg),
            AppError::Gateway { context, .. } | AppError::GatewayOutcomeUnknown { context, .. } => {
                error_resp(StatusCode::BAD_GATEWAY, code, context.to_string())
            }
            AppError::InvalidSignature(_) => error_resp(
                StatusCode::BAD_REQUEST,
                code,
                "Webhook signature verification failed".to_string(),
            ),
            AppError::Database(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                "Internal error".to_string(),
            ),
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message, "code": code.as_str() });
    (status, Json(body)).into_response()
}
