//! Error types for the console adapter.

use cmdkit_core::RegistrationError;
use thiserror::Error;

/// Errors raised while registering commands with the console host.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The core rejected the command description.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// The host command map refused the command.
    #[error("Host command map rejected '{name}': {error}")]
    CommandMap { name: String, error: anyhow::Error },
}

/// Result type alias for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;
