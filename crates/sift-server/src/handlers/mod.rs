//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod processing;
pub mod statements;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use processing::*;
pub use statements::*;
