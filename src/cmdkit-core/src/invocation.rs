//! Resolved arguments and the unit of work handed to an execution provider.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::anyhow;
use tracing::warn;

use crate::argument::Value;
use crate::description::Handler;
use crate::flag::Flags;
use crate::message::{MessageContext, MessageKey};
use crate::outcome::Outcome;

/// Resolved values of one invocation, in parameter order.
#[derive(Debug, Default)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
    flags: Flags,
}

impl Arguments {
    /// Create a bag from resolved entries in parameter order.
    pub fn new(entries: Vec<(String, Value)>, flags: Flags) -> Self {
        Self { entries, flags }
    }

    /// Value of the named parameter as `T`.
    ///
    /// `None` when the parameter is unknown, absent, or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.value(name)?.downcast_ref::<T>()
    }

    /// Raw value of the named parameter.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Value at a parameter position.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, value)| value)
    }

    /// Tokens of a limitless or list parameter.
    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.value(name)?.as_list()
    }

    /// Tokens of a set parameter.
    pub fn set(&self, name: &str) -> Option<&HashSet<String>> {
        self.value(name)?.as_set()
    }

    /// Whether the named parameter received a value.
    pub fn is_present(&self, name: &str) -> bool {
        self.value(name).is_some_and(|value| !value.is_absent())
    }

    /// Flags found on the command line.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the sub-command takes no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A fully resolved call, ready for an execution provider.
pub struct Invocation<S> {
    pub sender: S,
    pub arguments: Arguments,
    pub handler: Handler<S>,
    /// Context reported if the handler fails.
    pub context: MessageContext,
}

impl<S> Invocation<S> {
    /// Bundle a resolved call.
    pub fn new(sender: S, arguments: Arguments, handler: Handler<S>, context: MessageContext) -> Self {
        Self {
            sender,
            arguments,
            handler,
            context,
        }
    }

    /// Run the handler on the current thread.
    ///
    /// Errors and panics from the handler become `ExecutionFailed`.
    pub fn run(self) -> Outcome {
        let Self {
            sender,
            arguments,
            handler,
            context,
        } = self;

        let result = catch_unwind(AssertUnwindSafe(|| handler(&sender, &arguments)));
        let error = match result {
            Ok(Ok(())) => return Outcome::Executed,
            Ok(Err(error)) => error,
            Err(payload) => anyhow!("handler panicked: {}", panic_message(payload.as_ref())),
        };

        warn!(
            command = %context.command,
            sub_command = context.sub_command.as_deref().unwrap_or(""),
            error = %error,
            "Command handler failed"
        );
        Outcome::failed(MessageKey::EXECUTION_FAILED, context.with_error(error))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
