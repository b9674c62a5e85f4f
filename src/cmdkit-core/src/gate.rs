//! Pre-execute gate.
//!
//! The core carries no permission policy. A gate installed by the adapter is
//! asked once a sub-command has been selected and before any argument is
//! resolved; a denial becomes a failure outcome.

use crate::message::MessageKey;

/// What the gate sees about the selected route.
#[derive(Debug, Clone, Copy)]
pub struct GateContext<'a> {
    /// Command name as registered.
    pub command: &'a str,
    /// Sub-command path as registered; empty for the default sub-command.
    pub path: &'a [String],
    /// Permission declared on the sub-command, if any.
    pub permission: Option<&'a str>,
}

/// Gate verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny {
        /// Key rendered for the denial.
        key: MessageKey,
        /// Permission reported to the renderer.
        permission: Option<String>,
    },
}

impl GateDecision {
    /// Deny with [`MessageKey::NO_PERMISSION`].
    pub fn deny(permission: Option<String>) -> Self {
        Self::Deny {
            key: MessageKey::NO_PERMISSION,
            permission,
        }
    }

    /// Whether the route may run.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Hook deciding whether a sender may run a route.
pub trait ExecutionGate<S>: Send + Sync {
    fn check(&self, sender: &S, context: &GateContext<'_>) -> GateDecision;
}

impl<S, F> ExecutionGate<S> for F
where
    F: Fn(&S, &GateContext<'_>) -> GateDecision + Send + Sync,
{
    fn check(&self, sender: &S, context: &GateContext<'_>) -> GateDecision {
        self(sender, context)
    }
}
