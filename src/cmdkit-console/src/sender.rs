//! Console command senders.

use std::sync::Arc;

/// Anything that can run console commands: a player, the server console,
/// a command block.
pub trait ConsoleSender: Send + Sync {
    /// Display name.
    fn name(&self) -> &str;

    /// Deliver a reply. Hosts that forbid replies off the main thread only
    /// receive calls scheduled through [`MainThread`](crate::MainThread).
    fn send_message(&self, message: &str);

    /// Whether the sender holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}

impl<T: ConsoleSender + ?Sized> ConsoleSender for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send_message(&self, message: &str) {
        (**self).send_message(message)
    }

    fn has_permission(&self, permission: &str) -> bool {
        (**self).has_permission(permission)
    }
}

/// Split a console line into tokens.
///
/// A leading `/` is dropped and tokens are separated by any whitespace.
/// Quotes have no special meaning.
pub fn tokenize(line: &str) -> Vec<String> {
    let line = line.trim_start();
    let line = line.strip_prefix('/').unwrap_or(line);
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("/give  alex 5"), vec!["give", "alex", "5"]);
        assert_eq!(tokenize("  say \"hi there\" "), vec!["say", "\"hi", "there\""]);
        assert!(tokenize("/").is_empty());
        assert!(tokenize("").is_empty());
    }
}
