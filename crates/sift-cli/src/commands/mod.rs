//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db)
//! - `extract` - Extraction backend commands (health)
//! - `import` - Statement PDF import
//! - `serve` - Web server command
//! - `statements` - Statement commands (process, list, show, delete)

pub mod core;
pub mod extract;
pub mod import;
pub mod serve;
pub mod statements;

// Re-export command functions for main.rs
pub use core::*;
pub use extract::*;
pub use import::*;
pub use serve::*;
pub use statements::*;

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated. Counts chars rather than bytes so multibyte display names
/// never split mid-character.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut = s
        .char_indices()
        .nth(max.saturating_sub(3))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    format!("{}...", &s[..cut])
}
