//! HTTP layer for anifeed.
//!
//! This crate provides the page and JSON routes:
//!
//! - **Endpoints**: feed, explore, watchlist, profile and auth routes
//! - **Extractors**: authenticated identity, redirecting to login when absent
//! - **Middleware**: session resolution from cookie or bearer token
//! - **Flash**: one-shot messages carried in a cookie across a redirect
//!
//! Page routes return JSON view models; rendering them is left to a frontend.

pub mod endpoints;
pub mod extractors;
pub mod flash;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
