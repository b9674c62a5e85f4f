//! Command manager: registries, providers and the dispatch walk.

use std::any::Any;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::argument::ArgumentType;
use crate::command::{Command, SubCommand};
use crate::config::ManagerConfig;
use crate::description::{CommandDescription, ExecutionMode};
use crate::error::Result;
use crate::executor::{ExecutionProvider, PendingOutcome, WorkerPool};
use crate::flag::{FlagError, extract_flags};
use crate::gate::{ExecutionGate, GateContext, GateDecision};
use crate::invocation::{Arguments, Invocation};
use crate::message::{MessageContext, MessageKey, MessageRegistry};
use crate::outcome::{Failure, Outcome};
use crate::processor::CommandProcessor;
use crate::registry::CommandTree;
use crate::resolver::ArgumentRegistry;
use crate::snapshot::Snapshot;

/// Top-level registry of commands, resolvers and messages.
///
/// Every registry is an immutable snapshot swapped on write, so
/// [`dispatch`](Self::dispatch) may run concurrently with registration and
/// always sees either the old or the new state.
pub struct CommandManager<S> {
    config: ManagerConfig,
    processor: CommandProcessor,
    commands: Snapshot<CommandTree<S>>,
    arguments: Snapshot<ArgumentRegistry<S>>,
    messages: Snapshot<MessageRegistry<S>>,
    gate: RwLock<Option<Arc<dyn ExecutionGate<S>>>>,
    sync_provider: ExecutionProvider,
    async_provider: ExecutionProvider,
}

impl<S: Send + 'static> CommandManager<S> {
    /// Create a manager. Sub-commands declared asynchronous run on
    /// `async_provider`.
    pub fn new(config: ManagerConfig, async_provider: ExecutionProvider) -> Self {
        Self {
            processor: CommandProcessor::new(&config),
            commands: Snapshot::new(CommandTree::new(config.case_sensitive)),
            arguments: Snapshot::new(ArgumentRegistry::with_defaults()),
            messages: Snapshot::new(MessageRegistry::new()),
            gate: RwLock::new(None),
            sync_provider: ExecutionProvider::Sync,
            async_provider,
            config,
        }
    }

    /// Create a manager whose asynchronous sub-commands run on `handle`,
    /// at most `max_concurrent` at a time.
    pub fn with_runtime(config: ManagerConfig, handle: Handle) -> Self {
        let pool = WorkerPool::new(handle, config.max_concurrent);
        Self::new(config, ExecutionProvider::Async(pool))
    }

    /// Configuration the manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Processor used by [`register_command`](Self::register_command).
    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    /// Validate and register a command.
    ///
    /// Registering a name that already exists adds the new sub-commands to
    /// it; if any of their routes is already answered nothing is changed.
    pub fn register_command(&self, description: CommandDescription<S>) -> Result<()> {
        let command = self.processor.process(&description)?;
        self.register_processed(command)
    }

    /// Register a command already built by a processor.
    pub fn register_processed(&self, command: Command<S>) -> Result<()> {
        let name = command.name().to_string();
        let routes = command.sub_commands().len();
        self.commands.try_update(|tree| tree.register(command))?;
        info!(command = %name, routes, "Registered command");
        Ok(())
    }

    /// Remove a command and its aliases. Returns whether it existed.
    pub fn unregister_command(&self, name: &str) -> bool {
        let removed = self.commands.update(|tree| tree.unregister(name));
        match &removed {
            Some(command) => info!(command = %command.name(), "Unregistered command"),
            None => debug!(command = %name, "Unregister of unknown command ignored"),
        }
        removed.is_some()
    }

    /// Register the resolver for `T`. Returns `true` if one was replaced.
    pub fn register_argument<T, F>(&self, resolver: F) -> bool
    where
        T: Any + Send + Sync,
        F: Fn(&S, &str) -> Option<T> + Send + Sync + 'static,
    {
        let replaced = self.arguments.update(|registry| registry.register::<T, F>(resolver));
        debug!(argument_type = %ArgumentType::of::<T>(), replaced, "Registered argument resolver");
        replaced
    }

    /// Register the renderer for `key`. Returns `true` if one was replaced.
    pub fn register_message<F>(&self, key: MessageKey, renderer: F) -> bool
    where
        F: Fn(&S, &MessageContext) + Send + Sync + 'static,
    {
        let name = key.to_string();
        let replaced = self.messages.update(|registry| registry.register(key, renderer));
        debug!(key = %name, replaced, "Registered message renderer");
        replaced
    }

    /// Install the pre-execute gate, replacing any previous one.
    pub fn set_gate(&self, gate: impl ExecutionGate<S> + 'static) {
        *self.gate.write() = Some(Arc::new(gate));
    }

    /// Remove the gate; every route is allowed again.
    pub fn clear_gate(&self) {
        *self.gate.write() = None;
    }

    /// Snapshot of every registered command.
    pub fn commands(&self) -> Arc<CommandTree<S>> {
        self.commands.load()
    }

    /// Look up a command by name or alias.
    pub fn command(&self, name: &str) -> Option<Arc<Command<S>>> {
        self.commands.load().get(name).cloned()
    }

    /// Whether a command answers to `name` (name or alias).
    pub fn contains(&self, name: &str) -> bool {
        self.commands.load().contains(name)
    }

    /// Snapshot of the resolver registry.
    pub fn arguments(&self) -> Arc<ArgumentRegistry<S>> {
        self.arguments.load()
    }

    /// Snapshot of the message registry.
    pub fn messages(&self) -> Arc<MessageRegistry<S>> {
        self.messages.load()
    }

    /// Render a failure through its registered renderer.
    ///
    /// Returns `false` for `Executed` and for keys without a renderer.
    pub fn render(&self, sender: &S, outcome: &Outcome) -> bool {
        let Outcome::Failed(failure) = outcome else {
            return false;
        };
        let rendered = self
            .messages
            .load()
            .render(sender, &failure.key, &failure.context);
        if !rendered {
            debug!(key = %failure.key, "No renderer registered for message key");
        }
        rendered
    }

    /// Route `tokens`, resolve the arguments and run the handler.
    ///
    /// Lookup and resolution happen on the calling thread. Failures found
    /// there come back already completed; only execution of an asynchronous
    /// sub-command is deferred. Nothing is rendered here.
    pub fn dispatch<I, T>(&self, sender: S, tokens: I) -> PendingOutcome
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match self.prepare(sender, &tokens) {
            Ok((invocation, execution)) => match execution {
                ExecutionMode::Sync => self.sync_provider.submit(invocation),
                ExecutionMode::Async => self.async_provider.submit(invocation),
            },
            Err(failure) => {
                debug!(
                    key = %failure.key,
                    command = %failure.context.command,
                    "Dispatch rejected"
                );
                PendingOutcome::ready(failure.into())
            }
        }
    }

    fn prepare(
        &self,
        sender: S,
        tokens: &[String],
    ) -> std::result::Result<(Invocation<S>, ExecutionMode), Failure> {
        let Some((name, rest)) = tokens.split_first() else {
            return Err(Failure::new(MessageKey::UNKNOWN_COMMAND, MessageContext::default()));
        };

        let commands = self.commands.load();
        let Some(command) = commands.get(name) else {
            return Err(Failure::new(
                MessageKey::UNKNOWN_COMMAND,
                MessageContext::new(name.as_str()).with_typed_argument(name.as_str()),
            ));
        };

        let Some((sub_command, consumed)) = command.route(rest) else {
            let mut context = MessageContext::new(command.name());
            if let Some(token) = rest.first() {
                context = context.with_typed_argument(token.as_str());
            }
            return Err(Failure::new(MessageKey::UNKNOWN_SUB_COMMAND, context));
        };

        let mut context = MessageContext::new(command.name());
        if !sub_command.is_default() {
            context = context.with_sub_command(sub_command.label());
        }
        debug!(
            command = %command.name(),
            sub_command = %sub_command.label(),
            consumed,
            "Selected route"
        );

        self.check_gate(&sender, sub_command, &context)?;

        let resolvers = self.arguments.load();
        let arguments = resolve_arguments(
            sub_command,
            &sender,
            &rest[consumed..],
            &resolvers,
            self.config.flag_terminator,
            &context,
        )?;

        let invocation = Invocation::new(sender, arguments, Arc::clone(sub_command.handler()), context);
        Ok((invocation, sub_command.execution()))
    }

    fn check_gate(
        &self,
        sender: &S,
        sub_command: &SubCommand<S>,
        context: &MessageContext,
    ) -> std::result::Result<(), Failure> {
        let Some(gate) = self.gate.read().clone() else {
            return Ok(());
        };
        let gate_context = GateContext {
            command: sub_command.command(),
            path: sub_command.path(),
            permission: sub_command.permission(),
        };
        match gate.check(sender, &gate_context) {
            GateDecision::Allow => Ok(()),
            GateDecision::Deny { key, permission } => {
                let mut context = context.clone();
                if let Some(permission) = permission.or_else(|| sub_command.permission.clone()) {
                    context = context.with_permission(permission);
                }
                Err(Failure::new(key, context))
            }
        }
    }
}

/// Walk the argument list of `sub_command` over `tokens`.
fn resolve_arguments<S: 'static>(
    sub_command: &SubCommand<S>,
    sender: &S,
    tokens: &[String],
    resolvers: &ArgumentRegistry<S>,
    terminator: bool,
    context: &MessageContext,
) -> std::result::Result<Arguments, Failure> {
    let (flags, positional) = extract_flags(sub_command.flags(), tokens, sender, resolvers, terminator)
        .map_err(|error| flag_failure(error, context))?;

    let mut entries = Vec::with_capacity(sub_command.arguments().len());
    let mut remaining = positional.as_slice();
    for argument in sub_command.arguments() {
        let not_enough = || {
            Failure::new(
                MessageKey::NOT_ENOUGH_ARGUMENTS,
                context
                    .clone()
                    .with_argument_name(argument.name())
                    .with_argument_type(argument.value_type()),
            )
        };

        let value = if argument.is_variadic() {
            if remaining.is_empty() && !argument.is_optional() {
                return Err(not_enough());
            }
            let value = argument.resolve_rest(remaining);
            remaining = &[];
            value
        } else {
            match remaining.split_first() {
                Some((token, rest)) => {
                    remaining = rest;
                    argument
                        .resolve_token(sender, token, resolvers)
                        .map_err(|invalid| {
                            Failure::new(
                                MessageKey::INVALID_ARGUMENT,
                                context
                                    .clone()
                                    .with_argument_name(argument.name())
                                    .with_typed_argument(invalid.token)
                                    .with_argument_type(invalid.argument_type),
                            )
                        })?
                }
                None if argument.is_optional() => argument.absent_value(),
                None => return Err(not_enough()),
            }
        };
        entries.push((argument.name().to_string(), value));
    }

    if let Some(extra) = remaining.first() {
        return Err(Failure::new(
            MessageKey::TOO_MANY_ARGUMENTS,
            context.clone().with_typed_argument(extra.as_str()),
        ));
    }

    Ok(Arguments::new(entries, flags))
}

fn flag_failure(error: FlagError, context: &MessageContext) -> Failure {
    match error {
        FlagError::Missing(flag) => Failure::new(
            MessageKey::MISSING_REQUIRED_FLAG,
            context.clone().with_flag(flag.to_string()),
        ),
        FlagError::MissingArgument(flag) => {
            let mut context = context.clone().with_flag(flag.to_string());
            if let Some(argument_type) = flag.argument_type() {
                context = context.with_argument_type(argument_type);
            }
            Failure::new(MessageKey::MISSING_REQUIRED_FLAG_ARGUMENT, context)
        }
        FlagError::Invalid {
            flag,
            token,
            argument_type,
        } => Failure::new(
            MessageKey::INVALID_FLAG_ARGUMENT,
            context
                .clone()
                .with_flag(flag.to_string())
                .with_typed_argument(token)
                .with_argument_type(argument_type),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{ParameterDescription, SubCommandDescription};

    fn manager() -> CommandManager<()> {
        CommandManager::new(ManagerConfig::default(), ExecutionProvider::Sync)
    }

    fn outcome(manager: &CommandManager<()>, tokens: &[&str]) -> Outcome {
        match manager.dispatch((), tokens.iter().copied()).into_ready() {
            Ok(outcome) => outcome,
            Err(_) => panic!("synchronous dispatch was deferred"),
        }
    }

    #[test]
    fn test_empty_line_is_unknown_command() {
        assert!(outcome(&manager(), &[]).is(&MessageKey::UNKNOWN_COMMAND));
    }

    #[test]
    fn test_unknown_sub_command_context() {
        let manager = manager();
        manager
            .register_command(CommandDescription::new("user").sub_command(
                SubCommandDescription::new(|_: &(), _: &Arguments| Ok(())).path(["add"]),
            ))
            .unwrap();

        let result = outcome(&manager, &["user", "delete"]);
        assert!(result.is(&MessageKey::UNKNOWN_SUB_COMMAND));
        let context = result.context().unwrap();
        assert_eq!(context.command, "user");
        assert_eq!(context.typed_argument.as_deref(), Some("delete"));
    }

    #[test]
    fn test_invalid_argument_context() {
        let manager = manager();
        manager
            .register_command(CommandDescription::new("give").sub_command(
                SubCommandDescription::new(|_: &(), _: &Arguments| Ok(()))
                    .parameter(ParameterDescription::fixed::<i32>("amount")),
            ))
            .unwrap();

        let result = outcome(&manager, &["give", "xyz"]);
        assert!(result.is(&MessageKey::INVALID_ARGUMENT));
        let context = result.context().unwrap();
        assert_eq!(context.argument_name.as_deref(), Some("amount"));
        assert_eq!(context.typed_argument.as_deref(), Some("xyz"));
        assert_eq!(context.argument_type, Some(ArgumentType::of::<i32>()));
        assert!(context.sub_command.is_none());
    }

    #[test]
    fn test_missing_resolver_is_invalid_argument() {
        struct Unregistered;

        let manager = manager();
        manager
            .register_command(CommandDescription::new("spawn").sub_command(
                SubCommandDescription::new(|_: &(), _: &Arguments| Ok(()))
                    .parameter(ParameterDescription::fixed::<Unregistered>("mob")),
            ))
            .unwrap();

        assert!(outcome(&manager, &["spawn", "zombie"]).is(&MessageKey::INVALID_ARGUMENT));
    }

    #[test]
    fn test_render_uses_registered_renderer() {
        let manager = manager();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        assert!(!manager.register_message(MessageKey::UNKNOWN_COMMAND, move |_, context| {
            sink.lock().push(context.command.clone());
        }));

        let result = outcome(&manager, &["missing"]);
        assert!(manager.render(&(), &result));
        assert!(!manager.render(&(), &Outcome::Executed));
        assert_eq!(*seen.lock(), vec!["missing".to_string()]);
    }
}
