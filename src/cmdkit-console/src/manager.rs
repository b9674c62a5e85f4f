//! Console command manager.

use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;
use cmdkit_core::{
    ArgumentType, CommandDescription, CommandManager, GateContext, GateDecision, ManagerConfig, MessageContext,
    MessageKey, Outcome,
};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ConsoleError, Result};
use crate::host::{CommandMap, HostCommand, ServerLookup};
use crate::main_thread::MainThread;
use crate::messages;
use crate::sender::{ConsoleSender, tokenize};

/// Host services the console manager drives.
#[derive(Clone)]
pub struct ConsoleHost {
    /// Fallback prefix for the host command table, usually the plugin name.
    pub plugin_name: String,
    /// Runtime for asynchronous sub-commands.
    pub runtime: Handle,
    pub command_map: Arc<dyn CommandMap>,
    pub main_thread: Arc<dyn MainThread>,
}

/// Result of running a console line.
#[derive(Debug)]
pub enum ConsoleDispatch {
    /// Finished on the calling thread; any failure was already rendered.
    Completed(Outcome),
    /// Running on the worker pool. A failure is rendered on the main thread
    /// once it completes.
    Deferred(JoinHandle<Outcome>),
}

impl ConsoleDispatch {
    /// Whether the work is still running on the worker pool.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Wait for the outcome.
    pub async fn wait(self) -> Outcome {
        match self {
            Self::Completed(outcome) => outcome,
            Self::Deferred(task) => task.await.unwrap_or_else(|e| {
                Outcome::failed(
                    MessageKey::EXECUTION_FAILED,
                    MessageContext::default().with_error(anyhow!("Console task failed: {}", e)),
                )
            }),
        }
    }
}

/// Command manager for a game-server console.
///
/// Wraps a core [`CommandManager`] with default replies, a permission gate
/// backed by [`ConsoleSender::has_permission`], host argument types and
/// publication to the host command table.
pub struct ConsoleCommandManager<S> {
    core: Arc<CommandManager<S>>,
    host: ConsoleHost,
    /// Serializes core registration with the matching host side effect.
    registration: Mutex<()>,
}

impl<S> ConsoleCommandManager<S>
where
    S: ConsoleSender + Clone + Send + Sync + 'static,
{
    /// Create a manager with every default installed.
    pub fn create<L: ServerLookup>(config: ManagerConfig, host: ConsoleHost, lookup: L) -> Self {
        let core = Arc::new(CommandManager::with_runtime(config, host.runtime.clone()));

        messages::install_defaults(&core);
        core.set_gate(|sender: &S, context: &GateContext<'_>| match context.permission {
            Some(permission) if !sender.has_permission(permission) => {
                GateDecision::deny(Some(permission.to_string()))
            }
            _ => GateDecision::Allow,
        });

        let lookup = Arc::new(lookup);
        let players = Arc::clone(&lookup);
        register_lookup::<S, L::Player, _>(&core, move |_, name| players.player(name));
        let worlds = Arc::clone(&lookup);
        register_lookup::<S, L::World, _>(&core, move |_, name| worlds.world(name));
        register_lookup::<S, L::Material, _>(&core, move |_, name| lookup.material(name));

        info!(plugin = %host.plugin_name, "Console command manager ready");
        Self {
            core,
            host,
            registration: Mutex::new(()),
        }
    }

    /// The wrapped core manager.
    pub fn core(&self) -> &Arc<CommandManager<S>> {
        &self.core
    }

    /// Register a command with the core, then publish it to the host.
    ///
    /// Only a command new to the core is published; further sub-commands
    /// under an existing name join the existing host entry. If the host
    /// refuses, the core registration is rolled back.
    pub fn register_command(&self, description: CommandDescription<S>) -> Result<()> {
        let _guard = self.registration.lock();
        let name = description.name.clone();
        let is_new = !self.core.contains(&name);

        self.core.register_command(description)?;
        if !is_new {
            return Ok(());
        }

        let Some(command) = self.core.command(&name) else {
            return Ok(());
        };
        let entry = HostCommand::from_command(&command);
        if let Err(error) = self.publish(&entry) {
            self.core.unregister_command(&name);
            warn!(command = %name, error = %error, "Host refused command, registration rolled back");
            return Err(ConsoleError::CommandMap { name, error });
        }
        Ok(())
    }

    fn publish(&self, entry: &HostCommand) -> anyhow::Result<()> {
        let map = &self.host.command_map;
        // Entries this plugin declared statically are replaced by the live one.
        if map.owner(&entry.name).as_deref() == Some(self.host.plugin_name.as_str()) {
            debug!(command = %entry.name, "Replacing existing entry owned by this plugin");
            map.unregister(&entry.name)?;
        }
        map.register(&self.host.plugin_name, entry)
    }

    /// Remove a command from the host and the core. Returns whether it existed.
    ///
    /// The host goes first; if it refuses, the command stays registered in
    /// both.
    pub fn unregister_command(&self, name: &str) -> Result<bool> {
        let _guard = self.registration.lock();
        let Some(command) = self.core.command(name) else {
            return Ok(false);
        };
        self.host
            .command_map
            .unregister(command.name())
            .map_err(|error| ConsoleError::CommandMap {
                name: command.name().to_string(),
                error,
            })?;
        self.core.unregister_command(name);
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

    /// Run a console line for `sender`.
    ///
    /// Failures of synchronous work are rendered before returning. Failures
    /// of asynchronous work are rendered through the host main thread.
    pub fn execute(&self, sender: S, line: &str) -> ConsoleDispatch {
        let tokens = tokenize(line);
        debug!(sender = %sender.name(), line = %line, "Console command");

        match self.core.dispatch(sender.clone(), tokens).into_ready() {
            Ok(outcome) => {
                self.core.render(&sender, &outcome);
                ConsoleDispatch::Completed(outcome)
            }
            Err(pending) => {
                let core = Arc::clone(&self.core);
                let main_thread = Arc::clone(&self.host.main_thread);
                let task = self.host.runtime.spawn(async move {
                    let outcome = pending.await;
                    if !outcome.is_executed() {
                        let failed = outcome.clone();
                        main_thread.schedule(Box::new(move || {
                            core.render(&sender, &failed);
                        }));
                    }
                    outcome
                });
                ConsoleDispatch::Deferred(task)
            }
        }
    }
}

/// Register a host lookup unless its type already has a resolver.
///
/// A host type that is also a built-in type (`String` as the player type,
/// say) keeps the built-in resolver, which every other command relies on.
fn register_lookup<S, T, F>(core: &CommandManager<S>, resolver: F)
where
    S: Send + 'static,
    T: Any + Send + Sync,
    F: Fn(&S, &str) -> Option<T> + Send + Sync + 'static,
{
    let argument_type = ArgumentType::of::<T>();
    if core.arguments().contains(&argument_type) {
        warn!(argument_type = %argument_type, "Host type already has a resolver, keeping it");
        return;
    }
    core.register_argument::<T, F>(resolver);
}
