//! Firewall status and mutation service.

use tracing::{info, warn};

use super::session::{execute_all, execute_once};
use crate::domain::{FirewallStatus, RuleId, RuleProtocol};
use crate::error::{Error, Result};
use crate::parsers::parse_firewall_status;
use crate::ports::{SessionConnector, SshCredentials};

/// Numbered rule listing.
pub const STATUS_COMMAND: &str = "ufw status numbered";

/// Build the command allowing a port. No protocol suffix for `any`.
pub fn allow_command(port: u16, protocol: RuleProtocol) -> String {
    match protocol {
        RuleProtocol::Any => format!("ufw allow {}", port),
        proto => format!("ufw allow {}/{}", port, proto),
    }
}

/// Build the non-interactive delete of one positional rule.
pub fn delete_command(rule_id: RuleId) -> String {
    format!("ufw --force delete {}", rule_id)
}

/// Reject port 0 before anything is sent to the host.
fn validate_port(port: u16) -> Result<()> {
    if port == 0 {
        return Err(Error::InvalidArgument(
            "port must be between 1 and 65535".to_string(),
        ));
    }
    Ok(())
}

/// Application service for querying and changing ufw rules.
///
/// Rule ids are positional: deleting rule N renumbers every rule after it.
/// `remove` trusts the caller's id; `block` takes its own snapshot and
/// deletes highest id first. Concurrent mutations against the same host are
/// not serialized here.
pub struct FirewallService<C: SessionConnector> {
    connector: C,
}

impl<C: SessionConnector> FirewallService<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Fetch and parse the current rule listing.
    pub async fn status(&self, credentials: &SshCredentials) -> Result<FirewallStatus> {
        let output = execute_once(&self.connector, credentials, STATUS_COMMAND).await?;
        let status = parse_firewall_status(&output);
        if status.unparsed_lines > 0 {
            warn!(
                skipped = status.unparsed_lines,
                "Some ufw status lines were not recognized"
            );
        }
        Ok(status)
    }

    /// Add an allow rule for a port.
    pub async fn allow(
        &self,
        credentials: &SshCredentials,
        port: u16,
        protocol: RuleProtocol,
    ) -> Result<()> {
        validate_port(port)?;

        let command = allow_command(port, protocol);
        execute_once(&self.connector, credentials, &command).await?;
        info!(port, protocol = %protocol, "Allowed port");
        Ok(())
    }

    /// Delete one rule by its id in the most recent status snapshot.
    pub async fn remove(&self, credentials: &SshCredentials, rule_id: RuleId) -> Result<()> {
        let command = delete_command(rule_id);
        execute_once(&self.connector, credentials, &command).await?;
        info!(rule_id = rule_id.get(), "Deleted firewall rule");
        Ok(())
    }

    /// Delete every rule for a port, based on a fresh snapshot.
    ///
    /// Deletes run in descending id order in a single session, so no delete
    /// shifts the id of a rule still to be deleted. Returns the removed ids.
    pub async fn block(
        &self,
        credentials: &SshCredentials,
        port: u16,
        protocol: RuleProtocol,
    ) -> Result<Vec<RuleId>> {
        validate_port(port)?;

        let status = self.status(credentials).await?;
        let rule_ids = status.rule_ids_for(port, protocol);
        if rule_ids.is_empty() {
            info!(port, protocol = %protocol, "No firewall rules to remove");
            return Ok(rule_ids);
        }

        let commands: Vec<String> = rule_ids.iter().copied().map(delete_command).collect();
        let commands: Vec<&str> = commands.iter().map(String::as_str).collect();
        execute_all(&self.connector, credentials, &commands).await?;

        info!(port, protocol = %protocol, removed = rule_ids.len(), "Blocked port");
        Ok(rule_ids)
    }
}
