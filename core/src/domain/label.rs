//! Custom port label domain model.

use serde::{Deserialize, Serialize};

use super::{Protocol, RuleProtocol};

/// A user-chosen display name for a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomName {
    pub port: u16,
    #[serde(default)]
    pub protocol: RuleProtocol,
    #[serde(alias = "name")]
    pub label: String,
}

impl CustomName {
    pub fn new(port: u16, protocol: RuleProtocol, label: impl Into<String>) -> Self {
        Self {
            port,
            protocol,
            label: label.into(),
        }
    }

    /// Check if this label is stored under exactly this key.
    pub fn is_keyed(&self, port: u16, protocol: RuleProtocol) -> bool {
        self.port == port && self.protocol == protocol
    }
}

/// Find the label for a concrete port, preferring an exact protocol match
/// over an `any` label.
pub fn find_label(names: &[CustomName], port: u16, protocol: Protocol) -> Option<&str> {
    let exact = RuleProtocol::from(protocol);
    names
        .iter()
        .find(|n| n.is_keyed(port, exact))
        .or_else(|| names.iter().find(|n| n.is_keyed(port, RuleProtocol::Any)))
        .map(|n| n.label.as_str())
}
