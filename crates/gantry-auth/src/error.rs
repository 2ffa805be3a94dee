//! Authentication error types

use thiserror::Error;

/// Credential resolution and token exchange errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential file present but not usable
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A token endpoint rejected the exchange
    #[error("Token exchange failed: {status} - {message}")]
    TokenExchange { status: u16, message: String },

    /// No credential file and no ambient identity available
    #[error("No ambient credentials: {0}")]
    NoAmbientCredentials(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Result type for credential operations
pub type Result<T> = std::result::Result<T, AuthError>;
