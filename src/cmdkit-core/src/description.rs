//! Structural command descriptions assembled by adapters.
//!
//! Descriptions are plain data plus a handler. The
//! [`CommandProcessor`](crate::CommandProcessor) validates them into routes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::argument::{Argument, ArgumentKind, ArgumentType, ContainerKind};
use crate::error::Result;
use crate::flag::FlagSpec;
use crate::invocation::Arguments;

/// Handler invoked with the sender and the resolved arguments.
pub type Handler<S> = Arc<dyn Fn(&S, &Arguments) -> anyhow::Result<()> + Send + Sync>;

/// Which execution provider runs a sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// On the dispatching thread.
    #[default]
    Sync,
    /// On the manager's worker pool.
    Async,
}

/// Metadata for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescription {
    pub name: String,
    pub kind: ArgumentKind,
    pub value_type: ArgumentType,
    pub optional: bool,
}

impl ParameterDescription {
    /// A single-token parameter of type `T`.
    pub fn fixed<T: Any>(name: impl Into<String>) -> Self {
        Self::fixed_of(name, ArgumentType::of::<T>())
    }

    /// A single-token parameter with an explicit type.
    pub fn fixed_of(name: impl Into<String>, value_type: ArgumentType) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Fixed,
            value_type,
            optional: false,
        }
    }

    /// A parameter collecting the remaining tokens as strings.
    pub fn limitless(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Limitless,
            value_type: ArgumentType::of::<String>(),
            optional: false,
        }
    }

    /// A parameter collecting the remaining tokens into `container`.
    pub fn collection(name: impl Into<String>, container: ContainerKind) -> Self {
        Self {
            name: name.into(),
            kind: ArgumentKind::Collection(container),
            value_type: ArgumentType::of::<String>(),
            optional: false,
        }
    }

    /// A collection whose container is named, e.g. `"list"` or `"set"`.
    ///
    /// Fails for any other container name.
    pub fn collection_named(name: impl Into<String>, container: &str) -> Result<Self> {
        Ok(Self::collection(name, container.parse()?))
    }

    /// Mark the parameter optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The argument descriptor for this parameter.
    pub fn to_argument(&self) -> Argument {
        match self.kind {
            ArgumentKind::Fixed => Argument::fixed(&self.name, self.value_type, self.optional),
            ArgumentKind::Limitless => Argument::limitless(&self.name, self.optional),
            ArgumentKind::Collection(container) => {
                Argument::collection(&self.name, container, self.optional)
            }
        }
    }
}

/// Description of one handler under a command.
pub struct SubCommandDescription<S> {
    /// Path tokens; empty for the default sub-command.
    pub path: Vec<String>,
    /// Alternative paths answering the same handler.
    pub aliases: Vec<Vec<String>>,
    pub parameters: Vec<ParameterDescription>,
    pub flags: Vec<FlagSpec>,
    pub execution: ExecutionMode,
    /// Handed to the execution gate.
    pub permission: Option<String>,
    pub description: Option<String>,
    pub handler: Handler<S>,
}

impl<S: 'static> SubCommandDescription<S> {
    /// A default sub-command (empty path) running `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&S, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            path: Vec::new(),
            aliases: Vec::new(),
            parameters: Vec::new(),
            flags: Vec::new(),
            execution: ExecutionMode::Sync,
            permission: None,
            description: None,
            handler: Arc::new(handler),
        }
    }

    /// Set the sub-command path.
    pub fn path<I, T>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Add an alternative path.
    pub fn alias<I, T>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.aliases.push(path.into_iter().map(Into::into).collect());
        self
    }

    /// Append a positional parameter.
    pub fn parameter(mut self, parameter: ParameterDescription) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Declare a flag.
    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    /// Run on the asynchronous provider.
    pub fn asynchronous(mut self) -> Self {
        self.execution = ExecutionMode::Async;
        self
    }

    /// Require a permission, checked by the gate.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl<S> Clone for SubCommandDescription<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            aliases: self.aliases.clone(),
            parameters: self.parameters.clone(),
            flags: self.flags.clone(),
            execution: self.execution,
            permission: self.permission.clone(),
            description: self.description.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<S> fmt::Debug for SubCommandDescription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommandDescription")
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("parameters", &self.parameters)
            .field("flags", &self.flags)
            .field("execution", &self.execution)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

/// Description of a command and its sub-commands.
pub struct CommandDescription<S> {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub sub_commands: Vec<SubCommandDescription<S>>,
}

impl<S: 'static> CommandDescription<S> {
    /// Start a description for the command `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            sub_commands: Vec::new(),
        }
    }

    /// Add an alternative name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a sub-command.
    pub fn sub_command(mut self, sub_command: SubCommandDescription<S>) -> Self {
        self.sub_commands.push(sub_command);
        self
    }
}

impl<S> Clone for CommandDescription<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            sub_commands: self.sub_commands.clone(),
        }
    }
}

impl<S> fmt::Debug for CommandDescription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescription")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("sub_commands", &self.sub_commands)
            .finish()
    }
}
