//! Core business logic for anifeed.

pub mod format;
pub mod services;

pub use services::*;
