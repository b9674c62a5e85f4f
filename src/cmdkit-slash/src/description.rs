//! Slash command descriptions: the core description plus platform metadata.

use cmdkit_core::CommandDescription;

/// Role ids a command is enabled or disabled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub ids: Vec<u64>,
    pub disabled: bool,
}

/// Per-parameter metadata shown in the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMetadata {
    /// Sub-command path the parameter belongs to; empty for the default.
    pub path: Vec<String>,
    pub parameter: String,
    pub description: Option<String>,
    /// Fixed set of values the client offers. Empty means free input.
    pub choices: Vec<String>,
}

/// A command description with slash-only metadata.
pub struct SlashCommandDescription<S> {
    pub base: CommandDescription<S>,
    pub roles: Vec<RoleRule>,
    pub options: Vec<OptionMetadata>,
}

impl<S> SlashCommandDescription<S> {
    /// Wrap a core description without slash metadata.
    pub fn new(base: CommandDescription<S>) -> Self {
        Self {
            base,
            roles: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Enable the command for the given roles only.
    pub fn enable_roles(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.roles.push(RoleRule {
            ids: ids.into_iter().collect(),
            disabled: false,
        });
        self
    }

    /// Disable the command for the given roles.
    pub fn disable_roles(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.roles.push(RoleRule {
            ids: ids.into_iter().collect(),
            disabled: true,
        });
        self
    }

    /// Restrict a parameter to a fixed set of values.
    pub fn choices<P, T, C, V>(mut self, path: P, parameter: &str, choices: C) -> Self
    where
        P: IntoIterator<Item = T>,
        T: Into<String>,
        C: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        self.option_mut(path, parameter).choices = choices;
        self
    }

    /// Describe a parameter.
    pub fn describe_parameter<P, T>(mut self, path: P, parameter: &str, description: &str) -> Self
    where
        P: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.option_mut(path, parameter).description = Some(description.to_string());
        self
    }

    fn option_mut<P, T>(&mut self, path: P, parameter: &str) -> &mut OptionMetadata
    where
        P: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        let index = match self
            .options
            .iter()
            .position(|option| option.path == path && option.parameter == parameter)
        {
            Some(index) => index,
            None => {
                self.options.push(OptionMetadata {
                    path,
                    parameter: parameter.to_string(),
                    description: None,
                    choices: Vec::new(),
                });
                self.options.len() - 1
            }
        };
        &mut self.options[index]
    }
}

impl<S> From<CommandDescription<S>> for SlashCommandDescription<S> {
    fn from(base: CommandDescription<S>) -> Self {
        Self::new(base)
    }
}
