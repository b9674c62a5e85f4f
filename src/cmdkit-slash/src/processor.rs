//! Slash command processor.
//!
//! Runs the core processor unchanged, then checks what the slash platform
//! adds or cannot express.

use cmdkit_core::{ArgumentKind, Command, CommandProcessor, ManagerConfig};

use crate::description::{OptionMetadata, SlashCommandDescription};
use crate::error::{Result, SlashError};

/// Deepest sub-command path a slash command can express (group + sub-command).
pub const MAX_PATH_DEPTH: usize = 2;

/// Role restrictions extracted from a description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Privileges {
    pub enabled: Vec<u64>,
    pub disabled: Vec<u64>,
}

impl Privileges {
    /// Whether a member holding `roles` may run the command.
    ///
    /// Any disabled role denies. Otherwise a command without enabled roles is
    /// open to everyone, and one with enabled roles needs at least one.
    pub fn allows(&self, roles: &[u64]) -> bool {
        if roles.iter().any(|role| self.disabled.contains(role)) {
            return false;
        }
        self.enabled.is_empty() || roles.iter().any(|role| self.enabled.contains(role))
    }

    /// Whether any role rule was declared.
    pub fn is_restricted(&self) -> bool {
        !self.enabled.is_empty() || !self.disabled.is_empty()
    }

    fn extend(&mut self, other: Privileges) {
        for id in other.enabled {
            if !self.enabled.contains(&id) {
                self.enabled.push(id);
            }
        }
        for id in other.disabled {
            if !self.disabled.contains(&id) {
                self.disabled.push(id);
            }
        }
    }
}

/// A validated slash command ready for the core and the schema.
pub struct SlashCommand<S> {
    pub command: Command<S>,
    pub privileges: Privileges,
    pub options: Vec<OptionMetadata>,
}

/// Processor for slash command descriptions.
#[derive(Debug, Clone, Default)]
pub struct SlashCommandProcessor {
    base: CommandProcessor,
}

impl SlashCommandProcessor {
    /// Create a processor using the case policy of `config`.
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            base: CommandProcessor::new(config),
        }
    }

    /// The core processor every description goes through first.
    pub fn base(&self) -> &CommandProcessor {
        &self.base
    }

    /// Validate a description and extract its slash metadata.
    pub fn process<S>(&self, description: &SlashCommandDescription<S>) -> Result<SlashCommand<S>> {
        let command = self.base.process(&description.base)?;
        validate_layout(&command)?;
        for option in &description.options {
            validate_option(&command, option)?;
        }

        let mut privileges = Privileges::default();
        for rule in &description.roles {
            let extracted = if rule.disabled {
                Privileges {
                    enabled: Vec::new(),
                    disabled: rule.ids.clone(),
                }
            } else {
                Privileges {
                    enabled: rule.ids.clone(),
                    disabled: Vec::new(),
                }
            };
            privileges.extend(extracted);
        }

        Ok(SlashCommand {
            command,
            privileges,
            options: description.options.clone(),
        })
    }

    /// Check the command that registering `incoming` on top of `existing`
    /// would produce.
    pub fn validate_merge<S>(&self, existing: &Command<S>, incoming: &Command<S>) -> Result<()> {
        let mut merged = existing.clone();
        merged.merge(incoming.clone())?;
        validate_layout(&merged)
    }
}

/// Merge `other` into `privileges`, keeping each id once.
pub(crate) fn merge_privileges(privileges: &mut Privileges, other: Privileges) {
    privileges.extend(other);
}

fn validate_layout<S>(command: &Command<S>) -> Result<()> {
    let layout = |reason: &str| SlashError::InvalidLayout {
        command: command.name().to_string(),
        reason: reason.to_string(),
    };

    let sub_commands = command.sub_commands();
    if sub_commands.iter().any(|s| s.is_default()) && sub_commands.len() > 1 {
        return Err(layout("a default handler cannot sit next to sub-commands"));
    }
    for sub_command in sub_commands {
        if sub_command.path().len() > MAX_PATH_DEPTH {
            return Err(layout("sub-command paths are limited to two tokens"));
        }
        if !sub_command.aliases().is_empty() {
            return Err(layout("sub-command aliases are not supported"));
        }
        if !sub_command.flags().is_empty() {
            return Err(layout("flags are not supported"));
        }
        // A name is either a sub-command or a group, never both.
        if let [group, _] = sub_command.path() {
            if command.sub_command(std::slice::from_ref(group)).is_some() {
                return Err(layout("a sub-command cannot share its name with a group"));
            }
        }
    }
    Ok(())
}

fn validate_option<S>(command: &Command<S>, option: &OptionMetadata) -> Result<()> {
    let invalid = |reason: String| SlashError::InvalidChoices {
        command: command.name().to_string(),
        parameter: option.parameter.clone(),
        reason,
    };

    let Some(sub_command) = command.sub_command(&option.path) else {
        return Err(invalid(format!(
            "no sub-command at path '{}'",
            option.path.join(" ")
        )));
    };
    let Some(argument) = sub_command
        .arguments()
        .iter()
        .find(|argument| argument.name() == option.parameter)
    else {
        return Err(invalid("no such parameter".to_string()));
    };

    // Choices only make sense for single-token parameters.
    if !option.choices.is_empty() && argument.kind() != ArgumentKind::Fixed {
        return Err(invalid("choices require a single-token parameter".to_string()));
    }
    if option.choices.iter().any(|choice| choice.is_empty()) {
        return Err(invalid("choices must not be empty".to_string()));
    }
    Ok(())
}
