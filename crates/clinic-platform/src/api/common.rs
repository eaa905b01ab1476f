//! Common API types

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ClinicError;

/// Standard API error response. Every failure renders as this body with a
/// stable HTTP status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
}

/// Success response carrying only a message
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub type ApiResult<T> = Result<Json<T>, ClinicError>;
