//! Host server collaborators: the command table and name lookups.

use std::any::Any;

use cmdkit_core::{Argument, ArgumentKind, Command};

/// Entry published to the host command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    /// One usage line per sub-command.
    pub usage: String,
}

impl HostCommand {
    /// Build the host entry for a registered command.
    pub fn from_command<S>(command: &Command<S>) -> Self {
        let usage = command
            .sub_commands()
            .iter()
            .map(|sub_command| {
                let mut line = format!("/{}", command.name());
                for token in sub_command.path() {
                    line.push(' ');
                    line.push_str(token);
                }
                for argument in sub_command.arguments() {
                    line.push(' ');
                    line.push_str(&usage_token(argument));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            name: command.name().to_string(),
            aliases: command.aliases().to_vec(),
            description: command.description().map(str::to_string),
            usage,
        }
    }
}

/// `<name>` for required, `[name]` for optional, with `...` on variadics.
fn usage_token(argument: &Argument) -> String {
    let dots = match argument.kind() {
        ArgumentKind::Fixed => "",
        ArgumentKind::Limitless | ArgumentKind::Collection(_) => "...",
    };
    if argument.is_optional() {
        format!("[{}{}]", argument.name(), dots)
    } else {
        format!("<{}{}>", argument.name(), dots)
    }
}

/// The server's command table.
///
/// Called only after the core accepted a registration, so the host never
/// sees a command the core would reject.
pub trait CommandMap: Send + Sync {
    /// Publish `command` under the plugin's fallback prefix.
    fn register(&self, fallback_prefix: &str, command: &HostCommand) -> anyhow::Result<()>;

    /// Remove a command and its aliases.
    fn unregister(&self, name: &str) -> anyhow::Result<()>;

    /// Plugin that owns the existing entry for `name`, if any.
    fn owner(&self, name: &str) -> Option<String>;
}

/// Name lookups backing the host argument types.
///
/// Use distinct types. A type that already has a resolver, such as
/// `String`, keeps it and the lookup is not installed.
pub trait ServerLookup: Send + Sync + 'static {
    type Player: Any + Send + Sync;
    type World: Any + Send + Sync;
    type Material: Any + Send + Sync;

    /// Online player by exact name.
    fn player(&self, name: &str) -> Option<Self::Player>;

    fn world(&self, name: &str) -> Option<Self::World>;

    /// Material by name, ignoring case.
    fn material(&self, name: &str) -> Option<Self::Material>;
}
