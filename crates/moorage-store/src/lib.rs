//! Persistence for Moorage.
//!
//! Projects and installed apps live in SQLite. Id lists are stored as JSON
//! array strings and the config map as a JSON object string; both formats are
//! part of the on-disk contract.

pub mod error;
pub mod sqlite;
pub mod store;

pub use error::{Result, StoreError};
pub use sqlite::{MIGRATOR, SqliteStore};
pub use store::{AppStore, ProjectStore};
