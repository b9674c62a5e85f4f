//! The result of a dispatch call.

use crate::message::{MessageContext, MessageKey};

/// Renderable failure: the key selects the renderer, the context feeds it.
#[derive(Debug, Clone)]
pub struct Failure {
    pub key: MessageKey,
    pub context: MessageContext,
}

impl Failure {
    /// Create a failure for `key`.
    pub fn new(key: MessageKey, context: MessageContext) -> Self {
        Self { key, context }
    }
}

/// Single result type of a dispatch.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The handler ran to completion.
    Executed,
    /// Routing, resolution, the gate or the handler failed.
    Failed(Failure),
}

impl Outcome {
    /// Create a failed outcome.
    pub fn failed(key: MessageKey, context: MessageContext) -> Self {
        Self::Failed(Failure::new(key, context))
    }

    /// Whether the handler ran and returned `Ok`.
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }

    /// Message key of a failure.
    pub fn key(&self) -> Option<&MessageKey> {
        match self {
            Self::Executed => None,
            Self::Failed(failure) => Some(&failure.key),
        }
    }

    /// Rendering context of a failure.
    pub fn context(&self) -> Option<&MessageContext> {
        match self {
            Self::Executed => None,
            Self::Failed(failure) => Some(&failure.context),
        }
    }

    /// Whether this is a failure with `key`.
    pub fn is(&self, key: &MessageKey) -> bool {
        self.key() == Some(key)
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Self::Failed(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let executed = Outcome::Executed;
        assert!(executed.is_executed());
        assert!(executed.key().is_none());

        let failed = Outcome::failed(
            MessageKey::INVALID_ARGUMENT,
            MessageContext::new("give").with_typed_argument("xyz"),
        );
        assert!(!failed.is_executed());
        assert!(failed.is(&MessageKey::INVALID_ARGUMENT));
        assert_eq!(
            failed.context().and_then(|c| c.typed_argument.as_deref()),
            Some("xyz")
        );
    }
}
