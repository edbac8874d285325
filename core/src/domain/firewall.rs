//! Firewall rule domain models.

use std::num::NonZeroU32;

use serde::Serialize;

use super::RuleProtocol;

// ============================================================================
// RuleId
// ============================================================================

/// Positional index of a rule in one `ufw status numbered` listing.
///
/// Any insertion or deletion renumbers the rules after it, so a `RuleId` is
/// only meaningful against the snapshot it was read from. It serializes for
/// display but deliberately does not deserialize: ids are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RuleId(NonZeroU32);

impl RuleId {
    /// Wrap a positional index. Returns `None` for 0, which ufw never reports.
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FirewallRule
// ============================================================================

/// One numbered ufw rule with a single numeric port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    pub rule_id: RuleId,
    pub port: u16,
    pub protocol: RuleProtocol,
    /// Action phrase as printed, e.g. "ALLOW IN".
    pub action: String,
    /// Source column as printed, e.g. "Anywhere".
    pub source: String,
}

impl FirewallRule {
    /// Check if this rule applies to the given port and protocol selector.
    pub fn matches(&self, port: u16, protocol: RuleProtocol) -> bool {
        self.port == port && self.protocol.overlaps(protocol)
    }
}

impl std::fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}/{} {} {}",
            self.rule_id, self.port, self.protocol, self.action, self.source
        )
    }
}

// ============================================================================
// FirewallStatus
// ============================================================================

/// Parsed result of one status query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallStatus {
    pub active: bool,
    pub rules: Vec<FirewallRule>,
    /// Non-blank lines that yielded neither a rule nor known framing.
    pub unparsed_lines: usize,
}

impl FirewallStatus {
    /// Ids of every rule for `port` overlapping `protocol`, highest first.
    ///
    /// Deleting in this order keeps the remaining ids of the same snapshot
    /// valid, since ufw only renumbers rules after the deleted one.
    pub fn rule_ids_for(&self, port: u16, protocol: RuleProtocol) -> Vec<RuleId> {
        let mut ids: Vec<RuleId> = self
            .rules
            .iter()
            .filter(|r| r.matches(port, protocol))
            .map(|r| r.rule_id)
            .collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        ids.dedup();
        ids
    }
}
