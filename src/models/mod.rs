//! Data models for the magazine backend.
//!
//! JSON field names are camelCase to match existing clients.

mod admin;
mod magazine;

pub use admin::*;
pub use magazine::*;
