//! Application error types.

use std::fmt;

use crate::layer::LayerError;
use crate::store::{CacheError, HttpError};

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open the tile storage backend.
    StorageOpen(CacheError),

    /// Failed to create the HTTP client.
    HttpClient(HttpError),

    /// The tile layer configuration was rejected.
    Layer(LayerError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StorageOpen(e) => write!(f, "Failed to open tile storage: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::Layer(e) => write!(f, "Invalid tile layer: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::StorageOpen(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::Layer(e) => Some(e),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::StorageOpen(e)
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        AppError::HttpClient(e)
    }
}

impl From<LayerError> for AppError {
    fn from(e: LayerError) -> Self {
        AppError::Layer(e)
    }
}
