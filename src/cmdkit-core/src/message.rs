//! Message keys, rendering context and the per-manager renderer registry.
//!
//! The core never formats user-facing text. Every failure carries a
//! [`MessageKey`] and a [`MessageContext`]; adapters register a renderer per
//! key that replies to the sender however the host allows.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::argument::ArgumentType;

/// Identifies a kind of outcome message. Platforms may define their own keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageKey(Cow<'static, str>);

impl MessageKey {
    pub const UNKNOWN_COMMAND: Self = Self::from_static("unknown-command");
    pub const UNKNOWN_SUB_COMMAND: Self = Self::from_static("unknown-sub-command");
    pub const NOT_ENOUGH_ARGUMENTS: Self = Self::from_static("not-enough-arguments");
    pub const TOO_MANY_ARGUMENTS: Self = Self::from_static("too-many-arguments");
    pub const INVALID_ARGUMENT: Self = Self::from_static("invalid-argument");
    pub const MISSING_REQUIRED_FLAG: Self = Self::from_static("missing-required-flag");
    pub const MISSING_REQUIRED_FLAG_ARGUMENT: Self =
        Self::from_static("missing-required-flag-argument");
    pub const INVALID_FLAG_ARGUMENT: Self = Self::from_static("invalid-flag-argument");
    pub const NO_PERMISSION: Self = Self::from_static("no-permission");
    pub const EXECUTION_FAILED: Self = Self::from_static("execution-failed");

    /// Keys the core itself can emit.
    pub const DEFAULTS: [Self; 10] = [
        Self::UNKNOWN_COMMAND,
        Self::UNKNOWN_SUB_COMMAND,
        Self::NOT_ENOUGH_ARGUMENTS,
        Self::TOO_MANY_ARGUMENTS,
        Self::INVALID_ARGUMENT,
        Self::MISSING_REQUIRED_FLAG,
        Self::MISSING_REQUIRED_FLAG_ARGUMENT,
        Self::INVALID_FLAG_ARGUMENT,
        Self::NO_PERMISSION,
        Self::EXECUTION_FAILED,
    ];

    /// Create a key.
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    /// Key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data available to a renderer. Which fields are set depends on the key.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    /// Command name as registered.
    pub command: String,

    /// Sub-command path, space separated; `None` for the default sub-command
    /// or when lookup failed before a route was chosen.
    pub sub_command: Option<String>,

    /// Name of the offending parameter.
    pub argument_name: Option<String>,

    /// Raw token the sender typed.
    pub typed_argument: Option<String>,

    /// Declared type the token was resolved against.
    pub argument_type: Option<ArgumentType>,

    /// Flag involved in a flag failure, as `--long` or `-s`.
    pub flag: Option<String>,

    /// Permission that was required.
    pub permission: Option<String>,

    /// Error raised by the handler.
    pub error: Option<Arc<anyhow::Error>>,
}

impl MessageContext {
    /// Create a context for a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Set the sub-command path.
    pub fn with_sub_command(mut self, sub_command: impl Into<String>) -> Self {
        self.sub_command = Some(sub_command.into());
        self
    }

    /// Set the offending parameter name.
    pub fn with_argument_name(mut self, name: impl Into<String>) -> Self {
        self.argument_name = Some(name.into());
        self
    }

    /// Set the raw token the sender typed.
    pub fn with_typed_argument(mut self, token: impl Into<String>) -> Self {
        self.typed_argument = Some(token.into());
        self
    }

    /// Set the declared argument type.
    pub fn with_argument_type(mut self, argument_type: ArgumentType) -> Self {
        self.argument_type = Some(argument_type);
        self
    }

    /// Set the flag involved.
    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Set the required permission.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Attach the handler error.
    pub fn with_error(mut self, error: anyhow::Error) -> Self {
        self.error = Some(Arc::new(error));
        self
    }
}

/// Side-effecting renderer for one key.
pub type MessageRenderer<S> = Arc<dyn Fn(&S, &MessageContext) + Send + Sync>;

/// Mapping from key to renderer. The last registration for a key wins.
pub struct MessageRegistry<S> {
    renderers: HashMap<MessageKey, MessageRenderer<S>>,
}

impl<S: 'static> MessageRegistry<S> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Register a renderer. Returns `true` if an earlier renderer was replaced.
    pub fn register<F>(&mut self, key: MessageKey, renderer: F) -> bool
    where
        F: Fn(&S, &MessageContext) + Send + Sync + 'static,
    {
        self.renderers.insert(key, Arc::new(renderer)).is_some()
    }

    /// Renderer registered for `key`.
    pub fn get(&self, key: &MessageKey) -> Option<&MessageRenderer<S>> {
        self.renderers.get(key)
    }

    /// Whether `key` has a renderer.
    pub fn contains(&self, key: &MessageKey) -> bool {
        self.renderers.contains_key(key)
    }

    /// Run the renderer for `key`. Returns `false` if none is registered.
    pub fn render(&self, sender: &S, key: &MessageKey, context: &MessageContext) -> bool {
        match self.renderers.get(key) {
            Some(renderer) => {
                renderer(sender, context);
                true
            }
            None => false,
        }
    }

    /// Number of registered renderers.
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    /// Whether no renderer is registered.
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

impl<S: 'static> Default for MessageRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for MessageRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            renderers: self.renderers.clone(),
        }
    }
}
