//! Validated commands and their sub-command routes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::description::{ExecutionMode, Handler};
use crate::error::{RegistrationError, Result};
use crate::flag::FlagSpec;

/// Fold a name or path token for lookup.
pub(crate) fn fold(case_sensitive: bool, token: &str) -> String {
    if case_sensitive {
        token.to_string()
    } else {
        token.to_lowercase()
    }
}

/// One handler under a command, with its validated argument list.
pub struct SubCommand<S> {
    pub(crate) command: String,
    pub(crate) path: Vec<String>,
    pub(crate) aliases: Vec<Vec<String>>,
    pub(crate) arguments: Vec<Argument>,
    pub(crate) flags: Vec<FlagSpec>,
    pub(crate) execution: ExecutionMode,
    pub(crate) permission: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) handler: Handler<S>,
}

impl<S> SubCommand<S> {
    /// Name of the owning command.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Path as registered; empty for the default sub-command.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Alternative paths answering this sub-command.
    pub fn aliases(&self) -> &[Vec<String>] {
        &self.aliases
    }

    /// Positional arguments in declaration order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Declared flags.
    pub fn flags(&self) -> &[FlagSpec] {
        &self.flags
    }

    /// Provider the handler runs on.
    pub fn execution(&self) -> ExecutionMode {
        self.execution
    }

    /// Permission handed to the gate.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The handler to invoke.
    pub fn handler(&self) -> &Handler<S> {
        &self.handler
    }

    /// Whether this is the default sub-command (empty path).
    pub fn is_default(&self) -> bool {
        self.path.is_empty()
    }

    /// Space separated path, or the command name for the default sub-command.
    pub fn label(&self) -> String {
        if self.path.is_empty() {
            self.command.clone()
        } else {
            self.path.join(" ")
        }
    }

    /// Minimum and maximum positional token counts. `None` means unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        let required = self.arguments.iter().filter(|a| !a.is_optional()).count();
        if self.arguments.iter().any(Argument::is_variadic) {
            (required, None)
        } else {
            (required, Some(self.arguments.len()))
        }
    }

    /// Every path answering this sub-command: the primary one first.
    pub fn routes(&self) -> impl Iterator<Item = &[String]> {
        std::iter::once(self.path.as_slice()).chain(self.aliases.iter().map(Vec::as_slice))
    }
}

impl<S> fmt::Debug for SubCommand<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubCommand")
            .field("command", &self.command)
            .field("path", &self.path)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments)
            .field("flags", &self.flags)
            .field("execution", &self.execution)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

/// A registered command: name, aliases and a routing table over sub-commands.
pub struct Command<S> {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    sub_commands: Vec<Arc<SubCommand<S>>>,
    /// Folded path to index into `sub_commands`.
    routes: HashMap<Vec<String>, usize>,
    depth: usize,
    case_sensitive: bool,
}

impl<S> Command<S> {
    pub(crate) fn new(
        name: String,
        aliases: Vec<String>,
        description: Option<String>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            name,
            aliases,
            description,
            sub_commands: Vec::new(),
            routes: HashMap::new(),
            depth: 0,
            case_sensitive,
        }
    }

    /// Name as registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Sub-commands in registration order.
    pub fn sub_commands(&self) -> &[Arc<SubCommand<S>>] {
        &self.sub_commands
    }

    /// Sub-command answering exactly `path` (primary path or alias).
    pub fn sub_command<T: AsRef<str>>(&self, path: &[T]) -> Option<&Arc<SubCommand<S>>> {
        let key = self.key(path);
        self.routes.get(&key).map(|&index| &self.sub_commands[index])
    }

    /// Default sub-command, if one is registered.
    pub fn default_sub_command(&self) -> Option<&Arc<SubCommand<S>>> {
        self.sub_command::<&str>(&[])
    }

    /// Select the sub-command for `tokens` (the tokens after the command name).
    ///
    /// The longest registered path prefix wins. Without a match the default
    /// sub-command answers and consumes nothing. Returns the sub-command and
    /// the number of tokens its path consumed.
    pub fn route(&self, tokens: &[String]) -> Option<(&Arc<SubCommand<S>>, usize)> {
        for length in (1..=self.depth.min(tokens.len())).rev() {
            if let Some(sub_command) = self.sub_command(&tokens[..length]) {
                return Some((sub_command, length));
            }
        }
        self.default_sub_command().map(|sub_command| (sub_command, 0))
    }

    /// Add a validated sub-command, rejecting routes that are already answered.
    pub(crate) fn insert(&mut self, sub_command: SubCommand<S>) -> Result<()> {
        let keys = self.route_keys(&sub_command)?;
        self.insert_unchecked(sub_command, keys);
        Ok(())
    }

    /// Merge every sub-command of `other` into this command.
    ///
    /// Either all routes of `other` are free and everything is added, or
    /// nothing changes. Adapters merge into a clone to check the combined
    /// command before registering.
    pub fn merge(&mut self, other: Command<S>) -> Result<()> {
        let mut pending = Vec::with_capacity(other.sub_commands.len());
        for sub_command in &other.sub_commands {
            pending.push(self.route_keys(sub_command)?);
        }

        for alias in other.aliases {
            if !self.aliases.contains(&alias) {
                self.aliases.push(alias);
            }
        }
        if self.description.is_none() {
            self.description = other.description;
        }
        for (sub_command, keys) in other.sub_commands.into_iter().zip(pending) {
            let index = self.sub_commands.len();
            self.depth = self.depth.max(keys.iter().map(Vec::len).max().unwrap_or(0));
            for key in keys {
                self.routes.insert(key, index);
            }
            self.sub_commands.push(sub_command);
        }
        Ok(())
    }

    fn insert_unchecked(&mut self, sub_command: SubCommand<S>, keys: Vec<Vec<String>>) {
        let index = self.sub_commands.len();
        for key in keys {
            self.depth = self.depth.max(key.len());
            self.routes.insert(key, index);
        }
        self.sub_commands.push(Arc::new(sub_command));
    }

    /// Folded keys of every route of `sub_command`, checked against this command.
    fn route_keys(&self, sub_command: &SubCommand<S>) -> Result<Vec<Vec<String>>> {
        let mut keys: Vec<Vec<String>> = Vec::new();
        for path in sub_command.routes() {
            let key = self.key(path);
            if self.routes.contains_key(&key) || keys.contains(&key) {
                return Err(RegistrationError::DuplicateRoute {
                    command: self.name.clone(),
                    path: path.join(" "),
                });
            }
            keys.push(key);
        }
        Ok(keys)
    }

    fn key<T: AsRef<str>>(&self, path: &[T]) -> Vec<String> {
        path.iter()
            .map(|token| fold(self.case_sensitive, token.as_ref()))
            .collect()
    }
}

impl<S> Clone for Command<S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            aliases: self.aliases.clone(),
            description: self.description.clone(),
            sub_commands: self.sub_commands.clone(),
            routes: self.routes.clone(),
            depth: self.depth,
            case_sensitive: self.case_sensitive,
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("sub_commands", &self.sub_commands)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_command(path: &[&str]) -> SubCommand<()> {
        SubCommand {
            command: "root".to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
            aliases: Vec::new(),
            arguments: Vec::new(),
            flags: Vec::new(),
            execution: ExecutionMode::Sync,
            permission: None,
            description: None,
            handler: Arc::new(|_: &(), _: &crate::Arguments| Ok(())),
        }
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn command(case_sensitive: bool) -> Command<()> {
        let mut command = Command::new("root".to_string(), Vec::new(), None, case_sensitive);
        command.insert(sub_command(&[])).unwrap();
        command.insert(sub_command(&["user"])).unwrap();
        command.insert(sub_command(&["user", "add"])).unwrap();
        command
    }

    #[test]
    fn test_longest_prefix_wins() {
        let command = command(true);

        let (selected, consumed) = command.route(&tokens(&["user", "add", "bob"])).unwrap();
        assert_eq!(selected.path(), &tokens(&["user", "add"])[..]);
        assert_eq!(consumed, 2);

        let (selected, consumed) = command.route(&tokens(&["user", "bob"])).unwrap();
        assert_eq!(selected.path(), &tokens(&["user"])[..]);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_default_consumes_nothing() {
        let command = command(true);
        let (selected, consumed) = command.route(&tokens(&["other"])).unwrap();
        assert!(selected.is_default());
        assert_eq!(consumed, 0);
    }

    #[test]
    fn test_no_route_without_default() {
        let mut command = Command::new("root".to_string(), Vec::new(), None, true);
        command.insert(sub_command(&["list"])).unwrap();
        assert!(command.route(&tokens(&["other"])).is_none());
        assert!(command.route(&[]).is_none());
    }

    #[test]
    fn test_case_folding() {
        let command = command(false);
        let (selected, _) = command.route(&tokens(&["USER", "Add"])).unwrap();
        assert_eq!(selected.label(), "user add");

        let command = self::command(true);
        let (selected, _) = command.route(&tokens(&["USER"])).unwrap();
        assert!(selected.is_default());
    }

    #[test]
    fn test_alias_routes() {
        let mut command = Command::new("root".to_string(), Vec::new(), None, true);
        let mut aliased = sub_command(&["remove"]);
        aliased.aliases.push(tokens(&["rm"]));
        command.insert(aliased).unwrap();

        let (selected, _) = command.route(&tokens(&["rm"])).unwrap();
        assert_eq!(selected.label(), "remove");
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut command = command(true);
        let err = command.insert(sub_command(&["user"])).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateRoute {
                command: "root".to_string(),
                path: "user".to_string(),
            }
        );
    }

    #[test]
    fn test_merge_is_all_or_nothing() {
        let mut base = command(true);

        let mut other = Command::new("root".to_string(), Vec::new(), None, true);
        other.insert(sub_command(&["ban"])).unwrap();
        other.insert(sub_command(&["user"])).unwrap();

        assert!(base.merge(other).is_err());
        assert!(base.sub_command(&["ban"]).is_none());

        let mut other = Command::new("root".to_string(), vec!["r".to_string()], None, true);
        other.insert(sub_command(&["ban"])).unwrap();
        base.merge(other).unwrap();
        assert!(base.sub_command(&["ban"]).is_some());
        assert_eq!(base.aliases(), &["r".to_string()]);
        assert_eq!(base.sub_commands().len(), 4);
    }
}
