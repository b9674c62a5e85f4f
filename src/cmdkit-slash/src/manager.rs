//! Slash command manager.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use cmdkit_core::{
    Command, CommandManager, Failure, GateContext, GateDecision, ManagerConfig, MessageContext,
    MessageKey, Outcome,
};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::description::{OptionMetadata, SlashCommandDescription};
use crate::error::{Result, SlashError};
use crate::messages;
use crate::processor::{Privileges, SlashCommandProcessor, merge_privileges};
use crate::schema::CommandSchema;
use crate::sender::{SlashInvocation, SlashSender};

/// Where command schemas are published, usually the platform's HTTP API.
pub trait SchemaSink: Send + Sync {
    /// Create or overwrite a command.
    fn upload(&self, schema: &CommandSchema) -> anyhow::Result<()>;

    /// Delete a command by name.
    fn remove(&self, name: &str) -> anyhow::Result<()>;
}

/// Slash data kept next to a registered command.
#[derive(Debug, Clone, Default)]
struct SlashState {
    privileges: Privileges,
    options: Vec<OptionMetadata>,
}

type StateMap = Arc<RwLock<HashMap<String, SlashState>>>;

/// Key of a command in the state map, folded like the core folds names.
fn state_key(case_sensitive: bool, name: &str) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Command manager for a chat bot's slash commands.
///
/// Wraps a core [`CommandManager`] with default replies, a role gate and
/// schema publication.
pub struct SlashCommandManager<S> {
    core: Arc<CommandManager<S>>,
    processor: SlashCommandProcessor,
    /// Keyed by [`state_key`] of the command name.
    state: StateMap,
    case_sensitive: bool,
    sink: Arc<dyn SchemaSink>,
    registration: Mutex<()>,
}

impl<S> SlashCommandManager<S>
where
    S: SlashSender + Clone + Send + Sync + 'static,
{
    /// Create a manager with every default installed.
    pub fn create(config: ManagerConfig, runtime: Handle, sink: Arc<dyn SchemaSink>) -> Self {
        let processor = SlashCommandProcessor::new(&config);
        let case_sensitive = config.case_sensitive;
        let core = Arc::new(CommandManager::with_runtime(config, runtime));
        let state: StateMap = Arc::default();

        messages::install_defaults(&core);
        let roles = Arc::clone(&state);
        core.set_gate(move |sender: &S, context: &GateContext<'_>| {
            let allowed = roles
                .read()
                .get(&state_key(case_sensitive, context.command))
                .is_none_or(|state| state.privileges.allows(sender.roles()));
            if allowed {
                GateDecision::Allow
            } else {
                GateDecision::deny(None)
            }
        });

        info!("Slash command manager ready");
        Self {
            core,
            processor,
            state,
            case_sensitive,
            sink,
            registration: Mutex::new(()),
        }
    }

    /// The wrapped core manager.
    pub fn core(&self) -> &Arc<CommandManager<S>> {
        &self.core
    }

    /// Register a command and publish its schema.
    ///
    /// A command already registered under the same name gains the new
    /// sub-commands and roles and is published again as a whole. The combined
    /// command must still be a valid slash command. When the sink fails the
    /// command stays registered locally; [`sync`](Self::sync) publishes it
    /// later.
    pub fn register_command(&self, description: impl Into<SlashCommandDescription<S>>) -> Result<()> {
        let description = description.into();
        let _guard = self.registration.lock();

        let slash = self.processor.process(&description)?;
        if let Some(existing) = self.core.command(slash.command.name()) {
            self.processor.validate_merge(&existing, &slash.command)?;
        }
        let incoming = slash.command.name().to_string();
        self.core.register_processed(slash.command)?;
        // A merge keeps the name the command was first registered under.
        let name = self
            .core
            .command(&incoming)
            .map_or(incoming, |command| command.name().to_string());

        {
            let mut state = self.state.write();
            let entry = state
                .entry(state_key(self.case_sensitive, &name))
                .or_default();
            merge_privileges(&mut entry.privileges, slash.privileges);
            entry.options.extend(slash.options);
        }

        let schema = self.schema(&name).ok_or_else(|| SlashError::Upload {
            command: name.clone(),
            error: anyhow::anyhow!("command vanished during registration"),
        })?;
        self.sink.upload(&schema).map_err(|error| {
            warn!(command = %name, error = %error, "Failed to publish slash command");
            SlashError::Upload {
                command: name.clone(),
                error,
            }
        })?;
        debug!(command = %name, "Published slash command");
        Ok(())
    }

    /// Remove a command locally and from the platform. Returns whether it existed.
    pub fn unregister_command(&self, name: &str) -> Result<bool> {
        let _guard = self.registration.lock();
        let Some(command) = self.core.command(name) else {
            return Ok(false);
        };
        self.core.unregister_command(name);
        self.state
            .write()
            .remove(&state_key(self.case_sensitive, command.name()));
        self.sink
            .remove(command.name())
            .map_err(|error| SlashError::Upload {
                command: command.name().to_string(),
                error,
            })?;
        Ok(true)
    }

    /// Register the resolver for `T`, replacing any previous one.
    pub fn register_argument<T, F>(&self, resolver: F) -> bool
    where
        T: Any + Send + Sync,
        F: Fn(&S, &str) -> Option<T> + Send + Sync + 'static,
    {
        self.core.register_argument::<T, F>(resolver)
    }

    /// Register the reply for `key`, replacing any previous one.
    pub fn register_message<F>(&self, key: MessageKey, renderer: F) -> bool
    where
        F: Fn(&S, &MessageContext) + Send + Sync + 'static,
    {
        self.core.register_message(key, renderer)
    }

    /// Schema of one registered command.
    pub fn schema(&self, name: &str) -> Option<CommandSchema> {
        let command = self.core.command(name)?;
        let state = self.state.read();
        let slash = state
            .get(&state_key(self.case_sensitive, command.name()))
            .cloned()
            .unwrap_or_default();
        Some(CommandSchema::build(&command, &slash.options, &slash.privileges))
    }

    /// Schemas of every registered command, sorted by name.
    pub fn schemas(&self) -> Vec<CommandSchema> {
        let commands = self.core.commands();
        commands
            .names()
            .into_iter()
            .filter_map(|name| self.schema(name))
            .collect()
    }

    /// Publish every registered command again. Returns how many were sent.
    pub fn sync(&self) -> Result<usize> {
        let schemas = self.schemas();
        for schema in &schemas {
            self.sink
                .upload(schema)
                .map_err(|error| SlashError::Upload {
                    command: schema.name.clone(),
                    error,
                })?;
        }
        info!(count = schemas.len(), "Synchronized slash commands");
        Ok(schemas.len())
    }

    /// Run an interaction and reply to any failure.
    pub async fn execute(&self, sender: S, invocation: &SlashInvocation) -> Outcome {
        debug!(
            user = sender.user_id(),
            command = %invocation.command,
            "Slash interaction"
        );

        let tokens = match self.core.command(&invocation.command) {
            Some(command) => {
                if let Some(failure) = self.check_choices(&sender, &command, invocation) {
                    let outcome = Outcome::from(failure);
                    self.core.render(&sender, &outcome);
                    return outcome;
                }
                invocation.to_tokens(&command)
            }
            None => vec![invocation.command.clone()],
        };

        let outcome = self.core.dispatch(sender.clone(), tokens).await;
        self.core.render(&sender, &outcome);
        outcome
    }

    /// Reject values outside a parameter's declared choices.
    ///
    /// Skipped for senders the role gate will deny, so they see the denial.
    fn check_choices(
        &self,
        sender: &S,
        command: &Command<S>,
        invocation: &SlashInvocation,
    ) -> Option<Failure> {
        let state = self.state.read();
        let slash = state.get(&state_key(self.case_sensitive, command.name()))?;
        if !slash.privileges.allows(sender.roles()) {
            return None;
        }
        let sub_command = command.sub_command(&invocation.path)?;

        for option in &slash.options {
            if option.choices.is_empty() {
                continue;
            }
            let owned = command
                .sub_command(&option.path)
                .is_some_and(|owner| Arc::ptr_eq(owner, sub_command));
            if !owned {
                continue;
            }
            let Some(value) = invocation.options.get(&option.parameter) else {
                continue;
            };
            let typed = value.to_string();
            if option.choices.contains(&typed) {
                continue;
            }

            let mut context = MessageContext::new(command.name())
                .with_argument_name(option.parameter.as_str())
                .with_typed_argument(typed);
            if !sub_command.is_default() {
                context = context.with_sub_command(sub_command.label());
            }
            if let Some(argument) = sub_command
                .arguments()
                .iter()
                .find(|argument| argument.name() == option.parameter)
            {
                context = context.with_argument_type(argument.value_type());
            }
            return Some(Failure::new(MessageKey::INVALID_ARGUMENT, context));
        }
        None
    }
}
