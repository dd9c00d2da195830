//! Core entity definitions for the todo service.
//!
//! This crate defines the `Task` record shared by every store backend and
//! the request layer, the create/update inputs that mutate it, and the
//! date arithmetic behind the "due soon" view.

mod input;
mod task;
mod timestamp;

pub use input::*;
pub use task::*;
pub use timestamp::*;
