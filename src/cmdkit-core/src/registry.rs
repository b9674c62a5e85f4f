//! Command registry: names and aliases to commands.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{Command, fold};
use crate::error::{RegistrationError, Result};

/// Map of registered commands.
///
/// Names and aliases share one namespace; an alias can never shadow another
/// command's name or alias.
pub struct CommandTree<S> {
    /// Folded name to command.
    commands: HashMap<String, Arc<Command<S>>>,
    /// Folded alias to folded name.
    aliases: HashMap<String, String>,
    case_sensitive: bool,
}

impl<S> CommandTree<S> {
    /// Create an empty tree with the given case policy.
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            commands: HashMap::new(),
            aliases: HashMap::new(),
            case_sensitive,
        }
    }

    /// Register a command.
    ///
    /// A command whose name is already registered is merged into the
    /// existing one; any route the existing command already answers rejects
    /// the whole registration.
    pub fn register(&mut self, command: Command<S>) -> Result<()> {
        let key = fold(self.case_sensitive, command.name());

        if let Some(owner) = self.aliases.get(&key) {
            return Err(self.conflict(command.name(), owner));
        }
        for alias in command.aliases() {
            let alias_key = fold(self.case_sensitive, alias);
            if alias_key == key {
                continue;
            }
            let owner = match self.aliases.get(&alias_key) {
                Some(owner) => Some(owner.as_str()),
                None if self.commands.contains_key(&alias_key) => Some(alias_key.as_str()),
                None => None,
            };
            match owner {
                Some(owner) if owner != key => return Err(self.conflict(alias, owner)),
                _ => {}
            }
        }

        let alias_keys: Vec<String> = command
            .aliases()
            .iter()
            .map(|alias| fold(self.case_sensitive, alias))
            .filter(|alias_key| *alias_key != key)
            .collect();

        let merged = match self.commands.get(&key) {
            Some(existing) => {
                let mut merged = Command::clone(existing);
                merged.merge(command)?;
                merged
            }
            None => command,
        };

        for alias_key in alias_keys {
            self.aliases.insert(alias_key, key.clone());
        }
        self.commands.insert(key, Arc::new(merged));
        Ok(())
    }

    /// Remove a command by name or alias, together with all its aliases.
    pub fn unregister(&mut self, name: &str) -> Option<Arc<Command<S>>> {
        let key = self.resolve_key(name)?;
        let command = self.commands.remove(&key)?;
        self.aliases.retain(|_, owner| *owner != key);
        Some(command)
    }

    /// Look up a command by name or alias.
    pub fn get(&self, name: &str) -> Option<&Arc<Command<S>>> {
        let key = self.resolve_key(name)?;
        self.commands.get(&key)
    }

    /// Whether a command answers to `name` (name or alias).
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.values().map(|c| c.name()).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over registered commands in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Command<S>>> {
        self.commands.values()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn resolve_key(&self, name: &str) -> Option<String> {
        let key = fold(self.case_sensitive, name);
        if self.commands.contains_key(&key) {
            return Some(key);
        }
        self.aliases.get(&key).cloned()
    }

    fn conflict(&self, name: &str, owner_key: &str) -> RegistrationError {
        let existing = self
            .commands
            .get(owner_key)
            .map_or_else(|| owner_key.to_string(), |c| c.name().to_string());
        RegistrationError::NameConflict {
            name: name.to_string(),
            existing,
        }
    }
}

impl<S> Clone for CommandTree<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            aliases: self.aliases.clone(),
            case_sensitive: self.case_sensitive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{CommandDescription, SubCommandDescription};
    use crate::invocation::Arguments;
    use crate::processor::CommandProcessor;

    fn command(name: &str, aliases: &[&str], paths: &[&[&str]]) -> Command<()> {
        let mut description = CommandDescription::new(name);
        for alias in aliases {
            description = description.alias(*alias);
        }
        for path in paths {
            description = description.sub_command(
                SubCommandDescription::new(|_: &(), _: &Arguments| Ok(())).path(path.iter().copied()),
            );
        }
        CommandProcessor::default().process(&description).unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let mut tree = CommandTree::new(true);
        tree.register(command("teleport", &["tp"], &[&[]])).unwrap();

        assert!(tree.contains("teleport"));
        assert_eq!(tree.get("tp").map(|c| c.name()), Some("teleport"));
        assert!(tree.get("TP").is_none());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut tree = CommandTree::new(false);
        tree.register(command("Teleport", &["tp"], &[&[]])).unwrap();

        assert_eq!(tree.get("TELEPORT").map(|c| c.name()), Some("Teleport"));
        assert!(tree.contains("Tp"));
        assert_eq!(tree.names(), vec!["Teleport"]);
    }

    #[test]
    fn test_alias_conflicts() {
        let mut tree = CommandTree::new(true);
        tree.register(command("teleport", &["tp"], &[&[]])).unwrap();

        let err = tree.register(command("tp", &[], &[&[]])).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::NameConflict {
                name: "tp".to_string(),
                existing: "teleport".to_string(),
            }
        );

        let err = tree.register(command("warp", &["teleport"], &[&[]])).unwrap_err();
        assert!(matches!(err, RegistrationError::NameConflict { .. }));
        assert!(!tree.contains("warp"));
    }

    #[test]
    fn test_merge_and_reject() {
        let mut tree = CommandTree::new(true);
        tree.register(command("user", &[], &[&["add"]])).unwrap();
        tree.register(command("user", &["u"], &[&["remove"]])).unwrap();

        let user = tree.get("u").unwrap();
        assert_eq!(user.sub_commands().len(), 2);

        let err = tree.register(command("user", &[], &[&["add"]])).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));
        assert_eq!(tree.get("user").unwrap().sub_commands().len(), 2);
    }

    #[test]
    fn test_unregister_removes_aliases() {
        let mut tree = CommandTree::new(true);
        tree.register(command("teleport", &["tp", "warp"], &[&[]])).unwrap();

        let removed = tree.unregister("tp").unwrap();
        assert_eq!(removed.name(), "teleport");
        assert!(!tree.contains("teleport"));
        assert!(!tree.contains("warp"));
        assert!(tree.unregister("teleport").is_none());
        assert!(tree.is_empty());
    }
}
