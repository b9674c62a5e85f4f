//! Command manager configuration.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration shared by a [`CommandManager`](crate::CommandManager) and its processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Whether command names and sub-command paths match case-sensitively.
    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Maximum number of handlers running at once on the asynchronous provider.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Whether a literal `--` token stops flag parsing.
    #[serde(default = "default_true")]
    pub flag_terminator: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            max_concurrent: default_max_concurrent(),
            flag_terminator: true,
        }
    }
}

impl ManagerConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Match command names and paths without regard to case.
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Set the asynchronous worker limit (at least one).
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Fold a name according to the case policy.
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent() -> usize {
    16
}
