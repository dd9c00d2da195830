//! Task storage for the todo service.
//!
//! This crate provides the [`TaskStore`] abstraction and its two backends:
//! [`SqliteTaskStore`], a single-table SQLite database, and
//! [`LocalTaskStore`], which keeps the whole collection as one JSON document
//! in a key-value [`DocumentStorage`].

mod error;
mod local;
mod sqlite;
mod storage;
mod traits;

pub use error::*;
pub use local::*;
pub use sqlite::*;
pub use storage::*;
pub use traits::*;
