// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Only `Display` is fatal to the agent loop; every other variant is absorbed
/// inside the iteration that produced it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Display error: {0}")]
    Display(#[from] crate::port::DisplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// True when the error comes from the panel boundary (panel state unknown)
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Display(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
