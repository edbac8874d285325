//! Transport protocol types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ============================================================================
// Protocol
// ============================================================================

/// Concrete transport protocol of a reachable port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Both concrete protocols, in display order.
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(Error::InvalidArgument(format!(
                "unknown protocol '{}' (expected tcp or udp)",
                other
            ))),
        }
    }
}

// ============================================================================
// RuleProtocol
// ============================================================================

/// Protocol selector used by firewall rules and custom labels.
///
/// `Any` stands for both tcp and udp. It is expanded during lookup and never
/// becomes the key of a reconciled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleProtocol {
    Tcp,
    Udp,
    #[default]
    Any,
}

impl RuleProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleProtocol::Tcp => "tcp",
            RuleProtocol::Udp => "udp",
            RuleProtocol::Any => "any",
        }
    }

    /// The concrete protocols this selector covers.
    pub fn expand(&self) -> &'static [Protocol] {
        match self {
            RuleProtocol::Tcp => &[Protocol::Tcp],
            RuleProtocol::Udp => &[Protocol::Udp],
            RuleProtocol::Any => &Protocol::ALL,
        }
    }

    /// Check if this selector covers the given concrete protocol.
    pub fn covers(&self, protocol: Protocol) -> bool {
        self.expand().contains(&protocol)
    }

    /// Check if two selectors share at least one concrete protocol.
    pub fn overlaps(&self, other: RuleProtocol) -> bool {
        self.expand().iter().any(|p| other.covers(*p))
    }
}

impl From<Protocol> for RuleProtocol {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Tcp => RuleProtocol::Tcp,
            Protocol::Udp => RuleProtocol::Udp,
        }
    }
}

impl std::fmt::Display for RuleProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" | "" => Ok(RuleProtocol::Any),
            other => other.parse::<Protocol>().map(RuleProtocol::from).map_err(|_| {
                Error::InvalidArgument(format!(
                    "unknown protocol '{}' (expected tcp, udp or any)",
                    other
                ))
            }),
        }
    }
}
