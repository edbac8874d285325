//! CLI command implementations.

pub mod config;
pub mod firewall;
pub mod label;
pub mod list;

/// Shorten a cell to `max` characters for table output.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}
