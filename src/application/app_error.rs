use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The payment gateway rejected the call or could not be reached.
    /// `context` is the only part shown to callers.
    #[error("{context}: {detail}")]
    Gateway {
        context: &'static str,
        detail: String,
    },

    /// The call may have reached the gateway but no answer came back
    /// (timeout, dropped connection, 5xx). It may have been applied.
    #[error("{context}: {detail}")]
    GatewayOutcomeUnknown {
        context: &'static str,
        detail: String,
    },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn gateway(context: &'static str, detail: impl Into<String>) -> Self {
        AppError::Gateway {
            context,
            detail: detail.into(),
        }
    }

    pub fn gateway_outcome_unknown(context: &'static str, detail: impl Into<String>) -> Self {
        AppError::GatewayOutcomeUnknown {
            context,
            detail: detail.into(),
        }
    }

    /// Replaces the caller-facing context of a gateway error, leaving
    /// every other variant untouched.
    pub fn in_context(self, context: &'static str) -> Self {
        match self {
            AppError::Gateway { detail, .. } => AppError::Gateway { context, detail },
            AppError::GatewayOutcomeUnknown { detail, .. } => {
                AppError::GatewayOutcomeUnknown { context, detail }
            }
            other => other,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Gateway { .. } | AppError::GatewayOutcomeUnknown { .. } => {
                ErrorCode::GatewayError
            }
            AppError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    Conflict,
    GatewayError,
    InvalidSignature,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
