//! Slash interactions and the members that send them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cmdkit_core::Command;
use serde::{Deserialize, Serialize};

/// A guild member running a slash command.
pub trait SlashSender: Send + Sync {
    fn user_id(&self) -> u64;

    /// Role ids the member holds in the guild the interaction came from.
    fn roles(&self) -> &[u64];

    /// Answer the interaction.
    fn reply(&self, message: &str);
}

impl<T: SlashSender + ?Sized> SlashSender for Arc<T> {
    fn user_id(&self) -> u64 {
        (**self).user_id()
    }

    fn roles(&self) -> &[u64] {
        (**self).roles()
    }

    fn reply(&self, message: &str) {
        (**self).reply(message)
    }
}

/// Value of one filled option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Number(value) => write!(f, "{}", value),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// An interaction as delivered by the platform: the invoked route and the
/// options the member filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlashInvocation {
    pub command: String,
    /// Sub-command group and sub-command names; empty for a plain command.
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub options: HashMap<String, OptionValue>,
}

impl SlashInvocation {
    /// Start an interaction for `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Set the sub-command group and sub-command names.
    pub fn path<I, T>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Fill an option.
    pub fn option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Flatten the interaction into the token line the core dispatches.
    ///
    /// Options follow the declared parameter order. Variadic options are
    /// split on whitespace. The first unfilled option ends the line, so later
    /// optional options are dropped with it.
    pub fn to_tokens<S>(&self, command: &Command<S>) -> Vec<String> {
        let mut tokens = Vec::with_capacity(1 + self.path.len() + self.options.len());
        tokens.push(self.command.clone());
        tokens.extend(self.path.iter().cloned());

        let Some(sub_command) = command.sub_command(&self.path) else {
            return tokens;
        };
        for argument in sub_command.arguments() {
            let Some(value) = self.options.get(argument.name()) else {
                break;
            };
            match value {
                OptionValue::String(text) if argument.is_variadic() => {
                    tokens.extend(text.split_whitespace().map(str::to_string));
                }
                other => tokens.push(other.to_string()),
            }
        }
        tokens
    }
}
