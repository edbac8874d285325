//! Error types for the portwarden-core library.

use thiserror::Error;

/// Result type alias for portwarden operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying or mutating a remote host.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unusable settings (host, username, credential material).
    #[error("Configuration error: {0}")]
    Config(String),

    /// SSH transport or authentication failure.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A remote command exited with a non-zero status.
    #[error("Command failed with code {exit_code}: {output}")]
    Command { exit_code: u32, output: String },

    /// Connecting or executing exceeded its time bound.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The container management API could not be queried.
    #[error("Container API error: {0}")]
    ExternalService(String),

    /// A caller-supplied value was rejected before anything was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
