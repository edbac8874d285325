//! Unified port view and the reconciliation that builds it.

use std::collections::HashMap;

use serde::Serialize;

use super::label::find_label;
use super::{
    ContainerPortMapping, ContainerRef, CustomName, FirewallRule, ListeningSocket, Protocol,
};

// ============================================================================
// PortKey / PortState
// ============================================================================

/// Identity of a reconciled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PortKey {
    pub port: u16,
    pub protocol: Protocol,
}

impl PortKey {
    pub fn new(port: u16, protocol: Protocol) -> Self {
        Self { port, protocol }
    }
}

impl std::fmt::Display for PortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Which source first produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PortState {
    /// A process on the host is listening on the port.
    OpenOnHost,
    /// A container publishes the port but no host socket was seen.
    OpenInContainer,
    /// Only firewall rules mention the port.
    FirewallOnly,
}

impl PortState {
    pub fn display_name(&self) -> &'static str {
        match self {
            PortState::OpenOnHost => "open on host",
            PortState::OpenInContainer => "open in container",
            PortState::FirewallOnly => "firewall only",
        }
    }
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// UnifiedPortEntry
// ============================================================================

/// Everything known about one (port, protocol) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedPortEntry {
    pub port: u16,
    pub protocol: Protocol,
    pub state: PortState,
    pub process_descriptor: Option<String>,
    pub container_ref: Option<ContainerRef>,
    pub firewall_rules: Vec<FirewallRule>,
    pub label: Option<String>,
}

impl UnifiedPortEntry {
    fn new(key: PortKey, state: PortState) -> Self {
        Self {
            port: key.port,
            protocol: key.protocol,
            state,
            process_descriptor: None,
            container_ref: None,
            firewall_rules: Vec::new(),
            label: None,
        }
    }

    pub fn key(&self) -> PortKey {
        PortKey::new(self.port, self.protocol)
    }

    /// Check if at least one firewall rule mentions this port.
    pub fn is_allowed(&self) -> bool {
        !self.firewall_rules.is_empty()
    }
}

// ============================================================================
// PortsReport
// ============================================================================

/// Skipped-line counters of the two text parsers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnparsedLines {
    pub firewall: usize,
    pub sockets: usize,
}

/// Result of a "list ports" operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortsReport {
    pub ufw_active: bool,
    pub ports: Vec<UnifiedPortEntry>,
    /// Why parts of the container data are missing, if they are.
    pub warnings: Vec<String>,
    pub unparsed_lines: UnparsedLines,
}

impl PortsReport {
    /// Find the entry for a port and protocol.
    pub fn find(&self, port: u16, protocol: Protocol) -> Option<&UnifiedPortEntry> {
        self.ports
            .iter()
            .find(|e| e.port == port && e.protocol == protocol)
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Keyed accumulator keeping one entry per `PortKey`.
#[derive(Default)]
struct PortTable {
    entries: Vec<UnifiedPortEntry>,
    index: HashMap<PortKey, usize>,
}

impl PortTable {
    fn entry(&mut self, key: PortKey, state: PortState) -> &mut UnifiedPortEntry {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push(UnifiedPortEntry::new(key, state));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }
}

/// Merge sockets, container mappings and firewall rules into one entry per
/// `(port, protocol)`, then attach custom labels.
///
/// The source that creates an entry decides its state: sockets first, then
/// published container ports, then firewall rules. Later sources only augment.
/// When several containers publish the same key the last one is kept.
/// Entries are sorted by port, tcp before udp.
pub fn reconcile(
    sockets: &[ListeningSocket],
    rules: &[FirewallRule],
    mappings: &[ContainerPortMapping],
    custom_names: &[CustomName],
) -> Vec<UnifiedPortEntry> {
    let mut table = PortTable::default();

    for socket in sockets {
        let entry = table.entry(
            PortKey::new(socket.port, socket.protocol),
            PortState::OpenOnHost,
        );
        if entry.process_descriptor.is_none() {
            entry.process_descriptor = socket.process_descriptor.clone();
        }
    }

    for mapping in mappings {
        let Some(public_port) = mapping.public_port else {
            continue;
        };
        let entry = table.entry(
            PortKey::new(public_port, mapping.protocol),
            PortState::OpenInContainer,
        );
        entry.container_ref = Some(mapping.container_ref());
    }

    for rule in rules {
        for protocol in rule.protocol.expand() {
            table
                .entry(PortKey::new(rule.port, *protocol), PortState::FirewallOnly)
                .firewall_rules
                .push(rule.clone());
        }
    }

    let mut entries = table.entries;
    for entry in &mut entries {
        entry.label = find_label(custom_names, entry.port, entry.protocol).map(str::to_string);
    }
    entries.sort_by_key(UnifiedPortEntry::key);
    entries
}
