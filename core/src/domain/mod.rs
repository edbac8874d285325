//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod container;
mod firewall;
mod label;
mod port;
mod protocol;
mod socket;

// Re-export all domain types
pub use container::{ContainerInventory, ContainerPortMapping, ContainerRef, EndpointWarning};
pub use firewall::{FirewallRule, FirewallStatus, RuleId};
pub use label::{find_label, CustomName};
pub use port::{reconcile, PortKey, PortState, PortsReport, UnifiedPortEntry, UnparsedLines};
pub use protocol::{Protocol, RuleProtocol};
pub use socket::{process_name, ListeningSocket};
