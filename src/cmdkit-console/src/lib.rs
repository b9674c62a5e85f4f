//! Game-server console adapter.
//!
//! Turns console lines into core dispatches and core outcomes into chat
//! replies. The host supplies its command table, its main-thread scheduler
//! and name lookups for players, worlds and materials.
//!
//! ```rust,ignore
//! use cmdkit_console::{ConsoleCommandManager, ConsoleHost, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let manager = ConsoleCommandManager::create(
//!     ManagerConfig::default(),
//!     ConsoleHost {
//!         plugin_name: "warps".to_string(),
//!         runtime: runtime.handle().clone(),
//!         command_map: Arc::new(server.command_map()),
//!         main_thread: Arc::new(queue.clone()),
//!     },
//!     server.lookup(),
//! );
//! manager.register_command(warp_command())?;
//!
//! // On every server tick:
//! queue.run_pending();
//! ```

mod error;
mod host;
mod main_thread;
mod manager;
pub mod messages;
mod sender;

pub use error::{ConsoleError, Result};
pub use host::{CommandMap, HostCommand, ServerLookup};
pub use main_thread::{Immediate, MainThread, Task, TaskQueue};
pub use manager::{ConsoleCommandManager, ConsoleDispatch, ConsoleHost};
pub use sender::{ConsoleSender, tokenize};
