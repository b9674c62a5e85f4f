//! Slash command schema published to the chat platform.

use std::sync::Arc;

use cmdkit_core::{Argument, ArgumentKind, ArgumentType, Command, SubCommand};
use serde::{Deserialize, Serialize};

use crate::description::OptionMetadata;
use crate::processor::Privileges;

/// Description used when none was declared; the platform requires one.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

/// Option type as understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Number,
    Boolean,
}

impl OptionKind {
    /// Platform type for a parameter.
    pub fn of_argument(argument: &Argument) -> Self {
        if argument.kind() != ArgumentKind::Fixed {
            return Self::String;
        }
        let value_type = argument.value_type();
        if is_integer(&value_type) {
            Self::Integer
        } else if value_type.is::<f32>() || value_type.is::<f64>() {
            Self::Number
        } else if value_type.is::<bool>() {
            Self::Boolean
        } else {
            Self::String
        }
    }
}

fn is_integer(value_type: &ArgumentType) -> bool {
    value_type.is::<i8>()
        || value_type.is::<i16>()
        || value_type.is::<i32>()
        || value_type.is::<i64>()
        || value_type.is::<isize>()
        || value_type.is::<u8>()
        || value_type.is::<u16>()
        || value_type.is::<u32>()
        || value_type.is::<u64>()
        || value_type.is::<usize>()
}

/// A selectable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSchema {
    pub name: String,
    pub value: String,
}

/// One option: a parameter, a sub-command or a sub-command group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<ChoiceSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
}

/// A top-level slash command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSchema {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSchema>,
    /// Whether members without an enabled role can see the command.
    pub default_permission: bool,
}

impl CommandSchema {
    /// Build the schema of a processed command.
    pub fn build<S>(command: &Command<S>, options: &[OptionMetadata], privileges: &Privileges) -> Self {
        let mut schema = Self {
            name: command.name().to_string(),
            description: describe(command.description()),
            options: Vec::new(),
            default_permission: privileges.enabled.is_empty(),
        };

        for sub_command in command.sub_commands() {
            let parameters = parameter_options(command, sub_command, options);
            match sub_command.path() {
                [] => schema.options.extend(parameters),
                [name] => schema.options.push(sub_command_option(name, sub_command, parameters)),
                [group, name, ..] => {
                    let leaf = sub_command_option(name, sub_command, parameters);
                    match schema.options.iter_mut().find(|option| {
                        option.kind == OptionKind::SubCommandGroup && option.name == *group
                    }) {
                        Some(existing) => existing.options.push(leaf),
                        None => schema.options.push(OptionSchema {
                            kind: OptionKind::SubCommandGroup,
                            name: group.clone(),
                            description: DEFAULT_DESCRIPTION.to_string(),
                            required: false,
                            choices: Vec::new(),
                            options: vec![leaf],
                        }),
                    }
                }
            }
        }
        schema
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serialize to a JSON value.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

fn describe(description: Option<&str>) -> String {
    description.unwrap_or(DEFAULT_DESCRIPTION).to_string()
}

fn sub_command_option<S>(name: &str, sub_command: &SubCommand<S>, options: Vec<OptionSchema>) -> OptionSchema {
    OptionSchema {
        kind: OptionKind::SubCommand,
        name: name.to_string(),
        description: describe(sub_command.description()),
        required: false,
        choices: Vec::new(),
        options,
    }
}

fn parameter_options<S>(
    command: &Command<S>,
    sub_command: &Arc<SubCommand<S>>,
    metadata: &[OptionMetadata],
) -> Vec<OptionSchema> {
    let metadata: Vec<&OptionMetadata> = metadata
        .iter()
        .filter(|m| {
            command
                .sub_command(&m.path)
                .is_some_and(|owner| Arc::ptr_eq(owner, sub_command))
        })
        .collect();
    sub_command
        .arguments()
        .iter()
        .map(|argument| {
            let meta = metadata
                .iter()
                .find(|m| m.parameter == argument.name());
            OptionSchema {
                kind: OptionKind::of_argument(argument),
                name: argument.name().to_string(),
                description: describe(meta.and_then(|m| m.description.as_deref())),
                required: !argument.is_optional(),
                choices: meta
                    .map(|m| {
                        m.choices
                            .iter()
                            .map(|choice| ChoiceSchema {
                                name: choice.clone(),
                                value: choice.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                options: Vec::new(),
            }
        })
        .collect()
}
