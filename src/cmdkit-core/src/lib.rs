//! Command definition and dispatch core.
//!
//! Platform adapters describe their commands as plain data, register them
//! with a [`CommandManager`], and hand it each invocation as a sender plus an
//! ordered token sequence. The manager routes the tokens to a sub-command,
//! resolves them into typed values, and runs the handler either on the
//! calling thread or on a worker pool. Every failure comes back as an
//! [`Outcome`] carrying a [`MessageKey`] that the adapter renders.
//!
//! # Describing a command
//!
//! ```rust,ignore
//! use cmdkit_core::{CommandDescription, ParameterDescription, SubCommandDescription};
//!
//! let give = CommandDescription::new("give").sub_command(
//!     SubCommandDescription::new(|sender: &Player, args| {
//!         let amount = args.get::<i32>("amount").copied().unwrap_or(1);
//!         sender.give(amount)
//!     })
//!     .parameter(ParameterDescription::fixed::<i32>("amount").optional()),
//! );
//! manager.register_command(give)?;
//! ```
//!
//! # Dispatching
//!
//! ```rust,ignore
//! let outcome = manager.dispatch(sender.clone(), ["give", "5"]).await;
//! manager.render(&sender, &outcome);
//! ```
//!
//! # Routing
//!
//! The first token selects the command by name or alias. The longest
//! registered sub-command path that prefixes the remaining tokens wins; if
//! none does, the default sub-command (empty path) answers. Declared flags
//! are pulled out next, then positional tokens are resolved in parameter
//! order. A limitless or collection parameter takes every remaining token
//! and must be last.

mod argument;
mod command;
mod config;
mod description;
mod error;
mod executor;
mod flag;
mod gate;
mod invocation;
mod manager;
mod message;
mod outcome;
mod processor;
mod registry;
mod resolver;
mod snapshot;

pub use argument::{Argument, ArgumentKind, ArgumentType, ContainerKind, InvalidToken, Value};
pub use command::{Command, SubCommand};
pub use config::ManagerConfig;
pub use description::{
    CommandDescription, ExecutionMode, Handler, ParameterDescription, SubCommandDescription,
};
pub use error::{ConfigError, RegistrationError, Result};
pub use executor::{ExecutionProvider, PendingOutcome, WorkerPool};
pub use flag::{FlagError, FlagSpec, Flags, extract_flags};
pub use gate::{ExecutionGate, GateContext, GateDecision};
pub use invocation::{Arguments, Invocation};
pub use manager::CommandManager;
pub use message::{MessageContext, MessageKey, MessageRegistry, MessageRenderer};
pub use outcome::{Failure, Outcome};
pub use processor::{CommandProcessor, validate_name};
pub use registry::CommandTree;
pub use resolver::{ArgumentRegistry, ResolverFn};

/// Re-export common types for convenience.
pub mod prelude {
    pub use crate::{
        Arguments, CommandDescription, CommandManager, ExecutionProvider, FlagSpec,
        ManagerConfig, MessageContext, MessageKey, Outcome, ParameterDescription,
        SubCommandDescription,
    };
}
