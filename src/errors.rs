//! Error types shared by the catalog, model and store layers.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Debug, Error)]
pub enum ScoutError {
    /// The similarity model was asked to fit zero catalog entries.
    #[error("cannot fit a similarity model on an empty corpus")]
    EmptyCorpus,
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// No engine has been installed yet (warm-up still running or failed).
    #[error("recommendation engine is not ready")]
    NotReady,
    #[error("worker pool error: {0}")]
    Worker(String),
}

impl ScoutError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyCorpus => "EMPTY_CORPUS",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "SERIALIZATION_ERROR",
            Self::NotReady => "NOT_READY",
            Self::Worker(_) => "WORKER_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl ResponseError for ScoutError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotReady | Self::EmptyCorpus => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: self.code(),
            message: self.to_string(),
        })
    }
}
