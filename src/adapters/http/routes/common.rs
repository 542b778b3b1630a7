//! Shared imports and request helpers for the route modules.

pub use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
pub use serde::Deserialize;
pub use serde_json::json;
pub use uuid::Uuid;

pub use crate::adapters::http::app_state::AppState;
pub use crate::app_error::{AppError, AppResult};

/// Parses a wire enum, turning a bad value into a 400.
pub(crate) fn parse_field<T>(raw: &str) -> AppResult<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse().map_err(AppError::Validation)
}
