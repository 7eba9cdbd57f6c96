// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Plane geometry mismatch: ink {ink_w}x{ink_h}, accent {accent_w}x{accent_h}")]
    GeometryMismatch {
        ink_w: u32,
        ink_h: u32,
        accent_w: u32,
        accent_h: u32,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
