//! Request-level failures and how they turn into HTTP responses.
//!
//! Every variant is terminal for its request. Store error text is passed
//! through verbatim in `details`; there is no auth boundary to protect, but
//! a hardened deployment should scrub it.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::fmt::Display;
use thiserror::Error;

use crate::data_access::store_error::StoreError;
use crate::error_response::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid request body")]
    MalformedInput(String),

    #[error("Invalid ID format")]
    InvalidIdentifier(String),

    #[error("Update payload cannot be empty")]
    EmptyPayload,

    #[error("Protected field modification attempt")]
    ProtectedField(Vec<String>),

    #[error("Invalid field type")]
    InvalidFieldType { field: String, expected: &'static str },

    #[error("Unknown field")]
    UnknownField(Vec<String>),

    #[error("Task not found")]
    NotFound(String),

    #[error("{context}")]
    Persistence { context: String, details: String },
}

impl ApiError {
    pub fn persistence(context: impl Into<String>, err: impl Display) -> Self {
        ApiError::Persistence { context: context.into(), details: err.to_string() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::Validation(_) | ApiError::EmptyPayload => None,
            ApiError::MalformedInput(reason) => Some(reason.clone()),
            ApiError::InvalidIdentifier(raw) => {
                Some(format!("The provided ID '{raw}' is not a valid task identifier"))
            }
            ApiError::ProtectedField(fields) => Some(format!(
                "The field(s) {} cannot be updated",
                quoted_list(fields)
            )),
            ApiError::InvalidFieldType { field, expected } => {
                Some(format!("Field '{field}' must be {expected}"))
            }
            ApiError::UnknownField(fields) => Some(format!(
                "The field(s) {} are not updatable task fields",
                quoted_list(fields)
            )),
            ApiError::NotFound(details) => Some(details.clone()),
            ApiError::Persistence { details, .. } => Some(details.clone()),
        }
    }
}

fn quoted_list(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("'{f}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::persistence("Database operation failed", e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse { error: self.to_string(), details: self.details() };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %body.error, details = ?body.details, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %body.error, details = ?body.details, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}
