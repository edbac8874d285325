//! Parser for `ufw status numbered`.
//!
//! ```text
//! Status: active
//!
//!      To                         Action      From
//!      --                         ------      ----
//! [ 1] 22/tcp                     ALLOW IN    Anywhere
//! [ 2] 80                         ALLOW IN    Anywhere
//! [ 3] 22/tcp (v6)                ALLOW IN    Anywhere (v6)
//! ```

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{FirewallRule, FirewallStatus, RuleId, RuleProtocol};

const ACTIVE_MARKER: &str = "Status: active";

fn rule_regex() -> &'static Regex {
    static RULE: OnceLock<Regex> = OnceLock::new();
    RULE.get_or_init(|| {
        Regex::new(r"^\[\s*(\d+)\]\s+(\S+)\s+([A-Z\s]+)\s+(.*)$").expect("valid ufw rule regex")
    })
}

/// Column header and separator lines printed above the rules.
fn is_framing(line: &str) -> bool {
    let trimmed = line.trim();
    (trimmed.starts_with("To") && trimmed.contains("Action"))
        || trimmed.chars().all(|c| c == '-' || c.is_whitespace())
}

/// Parse a port/protocol token such as `443/tcp` or `80`.
///
/// Returns `None` for ranges, service names and unknown protocols.
fn parse_target(token: &str) -> Option<(u16, RuleProtocol)> {
    let (port, protocol) = match token.split_once('/') {
        Some((port, protocol)) => (port, protocol.parse().ok()?),
        None => (token, RuleProtocol::Any),
    };
    let port: u16 = port.parse().ok()?;
    (port != 0).then_some((port, protocol))
}

fn parse_rule(line: &str) -> Option<FirewallRule> {
    let caps = rule_regex().captures(line)?;
    let rule_id = caps[1].parse().ok().and_then(RuleId::new)?;
    let (port, protocol) = parse_target(&caps[2])?;

    Some(FirewallRule {
        rule_id,
        port,
        protocol,
        action: caps[3].trim().to_string(),
        source: caps[4].trim().to_string(),
    })
}

/// Parse the output of `ufw status numbered`.
///
/// Absence of the active marker means the firewall is reported inactive.
pub fn parse_firewall_status(output: &str) -> FirewallStatus {
    let mut status = FirewallStatus::default();

    for line in output.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if line.contains(ACTIVE_MARKER) {
            status.active = true;
            continue;
        }

        match parse_rule(line) {
            Some(rule) => status.rules.push(rule),
            None if line.trim_start().starts_with("Status:") || is_framing(line) => {}
            None => {
                debug!(line = %line, "Skipping unrecognized ufw status line");
                status.unparsed_lines += 1;
            }
        }
    }

    status
}
