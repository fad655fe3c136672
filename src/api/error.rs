use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::blockchain::BlockchainError;

/// Errors returned by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing proof or id")]
    MissingFields,

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Ledger error: {0}")]
    Ledger(#[from] BlockchainError),
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// What went wrong
    pub message: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Ledger(err) = self {
            error!("Request aborted: {}", err);
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.to_string(),
        })
    }
}

/// Turns JSON extractor failures (bad syntax, wrong content type, wrong
/// field types) into a structured 400 response
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!("Malformed body on {} {}: {}", req.method(), req.path(), err);
    ApiError::MalformedRequest(err.to_string()).into()
}
