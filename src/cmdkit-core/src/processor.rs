//! Validation of command descriptions into routable commands.
//!
//! Every structural rule is checked here, at registration time. A description
//! that breaks one is rejected whole; nothing partially built is returned.

use std::collections::HashSet;

use tracing::debug;

use crate::command::{Command, SubCommand};
use crate::config::ManagerConfig;
use crate::description::{CommandDescription, SubCommandDescription};
use crate::error::{RegistrationError, Result};
use crate::flag::FlagSpec;

/// Builds [`Command`]s from [`CommandDescription`]s.
///
/// Platform processors wrap this one and validate their own metadata on
/// top; the base rules always apply.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    case_sensitive: bool,
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new(&ManagerConfig::default())
    }
}

impl CommandProcessor {
    /// Create a processor using the case policy of `config`.
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive,
        }
    }

    /// Whether names and paths are matched case-sensitively.
    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Validate a whole command description.
    pub fn process<S>(&self, description: &CommandDescription<S>) -> Result<Command<S>> {
        validate_name(&description.name)?;
        for alias in &description.aliases {
            validate_name(alias)?;
        }

        let mut command = Command::new(
            description.name.clone(),
            description.aliases.clone(),
            description.description.clone(),
            self.case_sensitive,
        );
        for sub_command in &description.sub_commands {
            command.insert(self.process_sub_command(&description.name, sub_command)?)?;
        }

        debug!(
            command = %description.name,
            sub_commands = description.sub_commands.len(),
            "Processed command description"
        );
        Ok(command)
    }

    /// Validate one sub-command of `command`.
    pub fn process_sub_command<S>(
        &self,
        command: &str,
        description: &SubCommandDescription<S>,
    ) -> Result<SubCommand<S>> {
        for token in description.path.iter().chain(description.aliases.iter().flatten()) {
            validate_name(token)?;
        }

        let label = if description.path.is_empty() {
            command.to_string()
        } else {
            description.path.join(" ")
        };

        let mut names = HashSet::new();
        let mut variadic: Option<&str> = None;
        let mut optional: Option<&str> = None;
        for parameter in &description.parameters {
            validate_name(&parameter.name)?;
            if !names.insert(parameter.name.as_str()) {
                return Err(RegistrationError::DuplicateParameter {
                    sub_command: label,
                    name: parameter.name.clone(),
                });
            }

            if let Some(first) = variadic {
                return Err(if parameter.kind.is_variadic() {
                    RegistrationError::MultipleVariadic {
                        sub_command: label,
                        first: first.to_string(),
                        second: parameter.name.clone(),
                    }
                } else {
                    RegistrationError::VariadicNotLast {
                        sub_command: label,
                        argument: first.to_string(),
                    }
                });
            }

            match optional {
                Some(optional) if !parameter.optional => {
                    return Err(RegistrationError::OptionalBeforeRequired {
                        sub_command: label,
                        optional: optional.to_string(),
                        required: parameter.name.clone(),
                    });
                }
                None if parameter.optional => optional = Some(parameter.name.as_str()),
                _ => {}
            }

            if parameter.kind.is_variadic() {
                variadic = Some(parameter.name.as_str());
            }
        }

        validate_flags(&label, &description.flags)?;

        Ok(SubCommand {
            command: command.to_string(),
            path: description.path.clone(),
            aliases: description.aliases.clone(),
            arguments: description
                .parameters
                .iter()
                .map(|parameter| parameter.to_argument())
                .collect(),
            flags: description.flags.clone(),
            execution: description.execution,
            permission: description.permission.clone(),
            description: description.description.clone(),
            handler: description.handler.clone(),
        })
    }
}

/// Names must be non-empty and free of whitespace.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(RegistrationError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_flags(label: &str, flags: &[FlagSpec]) -> Result<()> {
    let mut shorts = HashSet::new();
    let mut longs = HashSet::new();

    for flag in flags {
        let invalid = || RegistrationError::InvalidFlag {
            sub_command: label.to_string(),
            flag: flag.to_string(),
        };
        let duplicate = || RegistrationError::DuplicateFlag {
            sub_command: label.to_string(),
            flag: flag.to_string(),
        };

        if flag.short_name().is_none() && flag.long_name().is_none() {
            return Err(invalid());
        }
        if let Some(short) = flag.short_name() {
            if short == '-' || short == '=' || short.is_whitespace() {
                return Err(invalid());
            }
            if !shorts.insert(short) {
                return Err(duplicate());
            }
        }
        if let Some(long) = flag.long_name() {
            if long.starts_with('-') || long.contains('=') || validate_name(long).is_err() {
                return Err(invalid());
            }
            if !longs.insert(long) {
                return Err(duplicate());
            }
        }
    }
    Ok(())
}
