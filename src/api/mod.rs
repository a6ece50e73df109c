//! REST API module.
//!
//! Handlers return typed errors; `AppError` maps each kind to its status code.

mod magazines;

pub use magazines::*;
