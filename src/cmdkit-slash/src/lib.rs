//! Chat-bot slash command adapter.
//!
//! Validates command descriptions against what slash commands can express,
//! publishes their schema through a [`SchemaSink`] and turns interactions
//! back into core dispatches. Role restrictions replace permission strings.
//!
//! ```rust,ignore
//! use cmdkit_slash::{SlashCommandDescription, SlashCommandManager, SlashInvocation};
//!
//! let manager = SlashCommandManager::create(ManagerConfig::default(), handle, Arc::new(api));
//! manager.register_command(
//!     SlashCommandDescription::new(ban_command())
//!         .enable_roles([MODERATOR_ROLE])
//!         .choices(["user"], "reason", ["spam", "abuse"]),
//! )?;
//!
//! // For every interaction the gateway delivers:
//! let outcome = manager.execute(member, &interaction).await;
//! ```

mod description;
mod error;
mod manager;
pub mod messages;
mod processor;
mod schema;
mod sender;

pub use description::{OptionMetadata, RoleRule, SlashCommandDescription};
pub use error::{Result, SlashError};
pub use manager::{SchemaSink, SlashCommandManager};
pub use processor::{MAX_PATH_DEPTH, Privileges, SlashCommand, SlashCommandProcessor};
pub use schema::{ChoiceSchema, CommandSchema, DEFAULT_DESCRIPTION, OptionKind, OptionSchema};
pub use sender::{OptionValue, SlashInvocation, SlashSender};
