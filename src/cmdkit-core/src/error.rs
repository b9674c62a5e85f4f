//! Error types for command registration and configuration.
//!
//! Registration errors describe programming mistakes in a command
//! description. They are returned synchronously from registration and never
//! surface during dispatch, which reports everything through [`Outcome`].
//!
//! [`Outcome`]: crate::Outcome

use thiserror::Error;

/// Errors raised while turning a command description into routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A command, alias, path token or parameter name is empty or contains whitespace.
    #[error("Invalid name '{0}': names must be non-empty and contain no whitespace")]
    InvalidName(String),

    /// More than one variable-arity parameter.
    #[error(
        "Sub-command '{sub_command}' declares more than one variadic parameter ('{first}' and '{second}')"
    )]
    MultipleVariadic {
        sub_command: String,
        first: String,
        second: String,
    },

    /// A variable-arity parameter is followed by another parameter.
    #[error("Variadic parameter '{argument}' of sub-command '{sub_command}' must be the last parameter")]
    VariadicNotLast {
        sub_command: String,
        argument: String,
    },

    /// An optional parameter precedes a required one.
    #[error(
        "Optional parameter '{optional}' of sub-command '{sub_command}' precedes required parameter '{required}'"
    )]
    OptionalBeforeRequired {
        sub_command: String,
        optional: String,
        required: String,
    },

    /// Two parameters share a name.
    #[error("Sub-command '{sub_command}' declares parameter '{name}' more than once")]
    DuplicateParameter { sub_command: String, name: String },

    /// Two flags share a short or long name.
    #[error("Sub-command '{sub_command}' declares flag '{flag}' more than once")]
    DuplicateFlag { sub_command: String, flag: String },

    /// A flag has neither a short nor a long name, or an unusable one.
    #[error("Sub-command '{sub_command}' declares an invalid flag '{flag}'")]
    InvalidFlag { sub_command: String, flag: String },

    /// Collection container other than list or set.
    #[error("Unsupported collection container '{0}': expected a list or a set")]
    UnsupportedContainer(String),

    /// Route already answered by the command.
    #[error("Command '{command}' already answers sub-command path '{path}'")]
    DuplicateRoute { command: String, path: String },

    /// Name or alias already taken by another command.
    #[error("Name '{name}' is already used by command '{existing}'")]
    NameConflict { name: String, existing: String },
}

/// Result type alias for registration.
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Errors raised while loading a [`ManagerConfig`](crate::ManagerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistrationError::VariadicNotLast {
            sub_command: "give".to_string(),
            argument: "items".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Variadic parameter 'items' of sub-command 'give' must be the last parameter"
        );
    }

    #[test]
    fn test_name_conflict_display() {
        let err = RegistrationError::NameConflict {
            name: "tp".to_string(),
            existing: "teleport".to_string(),
        };
        assert!(err.to_string().contains("tp"));
        assert!(err.to_string().contains("teleport"));
    }
}
