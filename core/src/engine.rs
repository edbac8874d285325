//! PortWarden engine - the operation surface over one managed host.
//!
//! Settings are read from the repository at the start of every operation and
//! credentials are resolved before any network traffic. Nothing else is
//! cached between calls.

use std::path::PathBuf;

use tracing::info;

use crate::adapters::{PortainerClient, SshConnector};
use crate::application::{resolve_credentials, FirewallService, PortService};
use crate::config::{Settings, SettingsStore};
use crate::domain::{CustomName, FirewallStatus, PortsReport, RuleId, RuleProtocol};
use crate::error::{Error, Result};
use crate::ports::{ContainerSource, SessionConnector, SettingsRepository, SshCredentials};

/// Engine wired to the file store, SSH and the Portainer API.
pub type DefaultPortWarden = PortWarden<SettingsStore, SshConnector, PortainerClient>;

/// The main PortWarden engine.
pub struct PortWarden<R, C, D>
where
    R: SettingsRepository,
    C: SessionConnector + Clone,
    D: ContainerSource,
{
    settings: R,
    ports: PortService<C, D>,
}

impl DefaultPortWarden {
    /// Engine using `$PORTWARDEN_CONFIG` or `~/.portwarden/settings.json`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(
            SettingsStore::new()?,
            SshConnector::new(),
            PortainerClient::new(),
        ))
    }

    /// Engine using the given settings file.
    pub fn with_config_path(path: PathBuf) -> Self {
        Self::new(
            SettingsStore::with_path(path),
            SshConnector::new(),
            PortainerClient::new(),
        )
    }
}

impl<R, C, D> PortWarden<R, C, D>
where
    R: SettingsRepository,
    C: SessionConnector + Clone,
    D: ContainerSource,
{
    pub fn new(settings: R, connector: C, containers: D) -> Self {
        Self {
            settings,
            ports: PortService::new(connector, containers),
        }
    }

    fn firewall(&self) -> &FirewallService<C> {
        self.ports.firewall()
    }

    async fn credentials(&self) -> Result<SshCredentials> {
        let settings = self.settings.load_settings().await?;
        resolve_credentials(&settings).await
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// Build the unified view of sockets, container ports and firewall rules.
    pub async fn list_ports(&self) -> Result<PortsReport> {
        let settings = self.settings.load_settings().await?;
        let credentials = resolve_credentials(&settings).await?;
        let custom_names = self.settings.custom_names().await?;

        self.ports
            .list_ports(
                &credentials,
                settings.container_api().as_ref(),
                &custom_names,
            )
            .await
    }

    // =========================================================================
    // Firewall
    // =========================================================================

    pub async fn firewall_status(&self) -> Result<FirewallStatus> {
        let credentials = self.credentials().await?;
        self.firewall().status(&credentials).await
    }

    pub async fn allow_port(&self, port: u16, protocol: RuleProtocol) -> Result<()> {
        let credentials = self.credentials().await?;
        self.firewall().allow(&credentials, port, protocol).await
    }

    /// Delete a rule by the id shown in the latest status listing.
    ///
    /// Ids shift after every delete; callers must refresh before the next.
    pub async fn remove_rule(&self, rule_id: u32) -> Result<()> {
        let rule_id = RuleId::new(rule_id)
            .ok_or_else(|| Error::InvalidArgument("rule id must be positive".to_string()))?;
        let credentials = self.credentials().await?;
        self.firewall().remove(&credentials, rule_id).await
    }

    /// Delete every rule covering a port. Returns the ids that were removed.
    pub async fn block_port(&self, port: u16, protocol: RuleProtocol) -> Result<Vec<RuleId>> {
        let credentials = self.credentials().await?;
        self.firewall().block(&credentials, port, protocol).await
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Store a label. A blank label removes the stored one instead.
    pub async fn set_label(&self, port: u16, protocol: RuleProtocol, label: &str) -> Result<()> {
        let label = label.trim();
        if label.is_empty() {
            return self.remove_label(port, protocol).await;
        }
        self.settings
            .set_custom_name(CustomName::new(port, protocol, label))
            .await?;
        info!(port, protocol = %protocol, label, "Label saved");
        Ok(())
    }

    pub async fn remove_label(&self, port: u16, protocol: RuleProtocol) -> Result<()> {
        self.settings.delete_custom_name(port, protocol).await?;
        info!(port, protocol = %protocol, "Label removed");
        Ok(())
    }

    pub async fn custom_names(&self) -> Result<Vec<CustomName>> {
        self.settings.custom_names().await
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub async fn settings(&self) -> Result<Settings> {
        self.settings.load_settings().await
    }

    /// Update one setting by key and persist it.
    pub async fn update_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.settings.load_settings().await?;
        settings.set(key, value)?;
        self.settings.save_settings(&settings).await?;
        info!(key, "Setting updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mock::{MockConnector, MockContainers};
    use crate::application::{SOCKETS_COMMAND, STATUS_COMMAND};
    use crate::config::MemorySettings;
    use crate::domain::{ContainerInventory, Protocol};

    const STATUS: &str = "Status: active

     To                         Action      From
     --                         ------      ----
[ 1] 22/tcp                     ALLOW IN    Anywhere
[ 2] 53                         ALLOW IN    Anywhere
[ 3] 53/udp                     ALLOW IN    10.0.0.0/8
";

    const SOCKETS: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
udp   UNCONN 0      0      127.0.0.53%lo:53     0.0.0.0:*         users:((\"systemd-resolve\",pid=612,fd=13))
tcp   LISTEN 0      128          0.0.0.0:22     0.0.0.0:*         users:((\"sshd\",pid=812,fd=3))
";

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.set("host_ip", "10.0.0.2").unwrap();
        settings.set("ssh_username", "root").unwrap();
        settings.set("ssh_password", "secret").unwrap();
        settings
    }

    fn engine(
        settings: Settings,
        connector: MockConnector,
    ) -> PortWarden<MemorySettings, MockConnector, MockContainers> {
        PortWarden::new(
            MemorySettings::new(settings),
            connector,
            MockContainers::with(ContainerInventory::empty()),
        )
    }

    fn connector() -> MockConnector {
        MockConnector::new()
            .respond(STATUS_COMMAND, STATUS)
            .respond(SOCKETS_COMMAND, SOCKETS)
    }

    #[tokio::test]
    async fn test_incomplete_settings_fail_before_connecting() {
        let connector = connector();
        let engine = engine(Settings::default(), connector.clone());

        let result = engine.list_ports().await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_list_ports_applies_labels() {
        let engine = engine(settings(), connector());
        engine
            .set_label(53, RuleProtocol::Any, "dns")
            .await
            .unwrap();
        engine
            .set_label(53, RuleProtocol::Udp, "resolver")
            .await
            .unwrap();

        let report = engine.list_ports().await.unwrap();
        assert_eq!(
            report.find(53, Protocol::Udp).unwrap().label.as_deref(),
            Some("resolver")
        );
        assert_eq!(
            report.find(53, Protocol::Tcp).unwrap().label.as_deref(),
            Some("dns")
        );
        assert_eq!(report.find(53, Protocol::Udp).unwrap().firewall_rules.len(), 2);
    }

    #[tokio::test]
    async fn test_label_removal_round_trip() {
        let engine = engine(settings(), connector());
        engine
            .set_label(22, RuleProtocol::Tcp, "ssh")
            .await
            .unwrap();
        assert_eq!(engine.custom_names().await.unwrap().len(), 1);

        engine.set_label(22, RuleProtocol::Tcp, "  ").await.unwrap();
        assert!(engine.custom_names().await.unwrap().is_empty());

        let report = engine.list_ports().await.unwrap();
        assert_eq!(report.find(22, Protocol::Tcp).unwrap().label, None);
    }

    #[tokio::test]
    async fn test_remove_rule_validates_id() {
        let connector = connector();
        let engine = engine(settings(), connector.clone());

        let result = engine.remove_rule(0).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        engine.remove_rule(2).await.unwrap();
        assert_eq!(connector.commands(), vec!["ufw --force delete 2"]);
    }

    #[tokio::test]
    async fn test_block_port() {
        let connector = connector();
        let engine = engine(settings(), connector.clone());

        let removed = engine.block_port(53, RuleProtocol::Udp).await.unwrap();
        let removed: Vec<u32> = removed.iter().map(RuleId::get).collect();
        assert_eq!(removed, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_allow_port_zero_is_rejected() {
        let connector = connector();
        let engine = engine(settings(), connector.clone());

        assert!(matches!(
            engine.allow_port(0, RuleProtocol::Any).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.block_port(0, RuleProtocol::Any).await,
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_update_setting() {
        let engine = engine(Settings::default(), connector());

        engine.update_setting("ssh_port", "2222").await.unwrap();
        assert_eq!(engine.settings().await.unwrap().ssh_port, 2222);

        assert!(matches!(
            engine.update_setting("ssh_port", "ssh").await,
            Err(Error::Config(_))
        ));
        assert!(matches!(
            engine.update_setting("nope", "1").await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_read_fresh_each_operation() {
        let connector = connector();
        let engine = engine(Settings::default(), connector.clone());

        assert!(engine.firewall_status().await.is_err());

        engine.update_setting("host_ip", "10.0.0.2").await.unwrap();
        engine.update_setting("ssh_username", "root").await.unwrap();
        engine.update_setting("ssh_password", "secret").await.unwrap();

        let status = engine.firewall_status().await.unwrap();
        assert_eq!(status.rules.len(), 3);
    }
}
