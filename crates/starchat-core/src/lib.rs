//! StarChat Core - decision tables and client for the StarChat server
//!
//! This crate provides the in-memory model of StarChat decision-table exports
//! and the transformations applied to them, plus an HTTP client for the
//! server itself.
//!
//! # Main Components
//!
//! - **Versions and dialects**: StarChat 4.x and 5.x spell several fields
//!   differently; [`VersionTag`] picks the [`Dialect`] used to read a document
//! - **Decision tables**: [`DecisionTable`] parses a table export into
//!   [`State`]s, derives keyword/query predicates, builds a reduced table and
//!   translates documents between dialects
//! - **HTTP client**: [`http::StarChatClient`] talks to a running server
//!
//! # Example
//!
//! ```no_run
//! use starchat_core::{DecisionTable, Result, StrictMode};
//!
//! fn example() -> Result<()> {
//!     let table = DecisionTable::from_path("table.json", "4.2", StrictMode::Strict)?;
//!     let reduced = table.modified_decision_table()?;
//!     let reduced = DecisionTable::from_document(reduced, "4.2", StrictMode::Strict)?;
//!     let v5 = reduced.to_version("5.1", StrictMode::Strict)?;
//!     println!("{}", serde_json::to_string_pretty(v5.raw_document())?);
//!     Ok(())
//! }
//! ```

pub mod decision_table;
pub mod dialect;
pub mod error;
pub mod http;
pub mod state;
pub mod translate;
pub mod version;

// Re-export main types for convenience
pub use decision_table::DecisionTable;
pub use dialect::{Dialect, DialectField};
pub use error::{Error, Result, StrictMode};
pub use state::State;
pub use translate::rename_keys;
pub use version::{major_version, VersionTag};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }
}
