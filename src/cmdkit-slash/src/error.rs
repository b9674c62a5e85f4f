//! Error types for the slash-command adapter.

use cmdkit_core::RegistrationError;
use thiserror::Error;

/// Errors raised while registering or publishing slash commands.
#[derive(Debug, Error)]
pub enum SlashError {
    /// The core rejected the command description.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Choices attached to a parameter are unusable.
    #[error("Invalid choices for '{parameter}' of command '{command}': {reason}")]
    InvalidChoices {
        command: String,
        parameter: String,
        reason: String,
    },

    /// The command cannot be expressed as a slash command.
    #[error("Command '{command}' cannot be a slash command: {reason}")]
    InvalidLayout { command: String, reason: String },

    /// The schema sink refused the command.
    #[error("Failed to publish command '{command}': {error}")]
    Upload { command: String, error: anyhow::Error },
}

/// Result type alias for slash operations.
pub type Result<T> = std::result::Result<T, SlashError>;
