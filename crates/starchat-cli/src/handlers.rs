//! Command handlers for CLI subcommands
//!
//! Table commands work on local files only; server commands build a
//! [`starchat_core::http::StarChatClient`] from the configuration.

mod completions;
mod config;
mod server;
mod table;
mod utils;

pub use completions::handle_completions;
pub use config::handle_config;
pub use server::{handle_ask, handle_count, handle_dump, handle_upload};
pub use table::{handle_analyzer, handle_convert, handle_filter, handle_inspect, handle_parents};
