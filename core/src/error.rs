//! Error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// A remote command ran but exited non-zero, or the transport failed.
    /// Carries the same stdout/stderr/exit code a safe execution would
    /// have captured.
    #[error("remote command failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
