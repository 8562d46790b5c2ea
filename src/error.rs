//! # Error Types
//!
//! Custom error types for the referee link using `thiserror`.
//!
//! Parse-level conditions (noise bytes, checksum mismatches, truncated
//! captures) are not errors - they are normal outcomes of a shared, noisy
//! line and are summarized per capture cycle instead. The variants here cover
//! the faults that do escape a component.

use thiserror::Error;

/// Main error type for the referee link
#[derive(Debug, Error)]
pub enum RefereeLinkError {
    /// Protocol composition errors (oversized content, invalid records)
    #[error("referee protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial transport errors
    #[error("serial error: {0}")]
    Serial(String),

    /// No usable serial device
    #[error("no referee serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry journal encoding errors
    #[error("telemetry encode error: {0}")]
    Telemetry(#[from] serde_json::Error),
}

/// Result type alias for the referee link
pub type Result<T> = std::result::Result<T, RefereeLinkError>;
