//! Publish error types

use thiserror::Error;

/// Errors from the Play publishing workflow
#[derive(Debug, Error)]
pub enum PlayError {
    /// Credential resolution or token exchange failed
    #[error("Authentication failed: {0}")]
    Auth(#[from] gantry_auth::AuthError),

    /// API error from the Play Developer API
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Bundle upload failed
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Artifact missing or unreadable
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for publish operations
pub type Result<T> = std::result::Result<T, PlayError>;
