//! Port inventory application service.

use tracing::{info, warn};

use super::firewall_service::FirewallService;
use super::session::execute_once;
use crate::domain::{
    reconcile, ContainerInventory, ContainerPortMapping, CustomName, FirewallStatus, PortsReport,
    UnparsedLines,
};
use crate::error::Result;
use crate::parsers::parse_socket_listing;
use crate::ports::{ContainerApiConfig, ContainerSource, SessionConnector, SshCredentials};

/// Listening TCP and UDP sockets with owning processes.
pub const SOCKETS_COMMAND: &str = "ss -tulpn";

/// Application service producing the unified port view.
///
/// The firewall listing, the socket listing and the container inventory
/// are fetched concurrently, each SSH command over its own session.
pub struct PortService<C: SessionConnector + Clone, D: ContainerSource> {
    firewall: FirewallService<C>,
    connector: C,
    containers: D,
}

impl<C: SessionConnector + Clone, D: ContainerSource> PortService<C, D> {
    pub fn new(connector: C, containers: D) -> Self {
        Self {
            firewall: FirewallService::new(connector.clone()),
            connector,
            containers,
        }
    }

    /// The firewall service sharing this service's connector.
    pub fn firewall(&self) -> &FirewallService<C> {
        &self.firewall
    }

    /// Build the unified port report.
    ///
    /// Session or command failures fail the whole operation. Container
    /// data is best effort: a failed discovery or endpoint becomes a warning
    /// and the report is built from what was fetched.
    pub async fn list_ports(
        &self,
        credentials: &SshCredentials,
        container_api: Option<&ContainerApiConfig>,
        custom_names: &[CustomName],
    ) -> Result<PortsReport> {
        let (status, sockets, (mappings, warnings)) = tokio::join!(
            self.firewall.status(credentials),
            execute_once(&self.connector, credentials, SOCKETS_COMMAND),
            self.fetch_containers(container_api),
        );

        let FirewallStatus {
            active,
            rules,
            unparsed_lines: firewall_skipped,
        } = status?;
        let listing = parse_socket_listing(&sockets?);
        if listing.skipped > 0 {
            warn!(skipped = listing.skipped, "Some socket lines were not recognized");
        }

        let ports = reconcile(&listing.sockets, &rules, &mappings, custom_names);
        info!(
            ports = ports.len(),
            rules = rules.len(),
            containers = mappings.len(),
            "Port inventory built"
        );

        Ok(PortsReport {
            ufw_active: active,
            ports,
            warnings,
            unparsed_lines: UnparsedLines {
                firewall: firewall_skipped,
                sockets: listing.skipped,
            },
        })
    }

    /// Fetch container mappings, turning every failure into a warning.
    async fn fetch_containers(
        &self,
        api: Option<&ContainerApiConfig>,
    ) -> (Vec<ContainerPortMapping>, Vec<String>) {
        let Some(api) = api else {
            return (Vec::new(), Vec::new());
        };

        match self.containers.fetch(api).await {
            Ok(ContainerInventory { mappings, warnings }) => {
                for warning in &warnings {
                    warn!(
                        endpoint_id = warning.endpoint_id,
                        endpoint = %warning.endpoint_name,
                        reason = %warning.reason,
                        "Skipped container endpoint"
                    );
                }
                (mappings, warnings.iter().map(ToString::to_string).collect())
            }
            Err(e) => {
                warn!(error = %e, "Container discovery failed, continuing without container data");
                (Vec::new(), vec![e.to_string()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::firewall_service::STATUS_COMMAND;
    use crate::application::mock::{credentials, MockConnector, MockContainers};
    use crate::domain::{EndpointWarning, PortState, Protocol, RuleProtocol};
    use crate::error::Error;

    const STATUS: &str = "Status: active

     To                         Action      From
     --                         ------      ----
[ 1] 22/tcp                     ALLOW IN    Anywhere
[ 2] 9000                       ALLOW IN    Anywhere
";

    const SOCKETS: &str = "\
Netid State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
tcp   LISTEN 0      128          0.0.0.0:22         0.0.0.0:*     users:((\"sshd\",pid=812,fd=3))
udp   UNCONN 0      0            0.0.0.0:68         0.0.0.0:*
";

    fn api() -> ContainerApiConfig {
        ContainerApiConfig {
            base_url: "http://10.0.0.2:9000".to_string(),
            token: None,
            timeout: Duration::from_secs(1),
        }
    }

    fn mapping(public_port: Option<u16>) -> ContainerPortMapping {
        ContainerPortMapping {
            container_id: "abc123".to_string(),
            container_name: "web".to_string(),
            endpoint_id: 1,
            endpoint_name: "local".to_string(),
            private_port: 80,
            public_port,
            protocol: Protocol::Tcp,
        }
    }

    fn connector() -> MockConnector {
        MockConnector::new()
            .respond(STATUS_COMMAND, STATUS)
            .respond(SOCKETS_COMMAND, SOCKETS)
    }

    #[tokio::test]
    async fn test_list_ports_merges_all_sources() {
        let connector = connector();
        let inventory = ContainerInventory {
            mappings: vec![mapping(Some(8080)), mapping(None)],
            warnings: Vec::new(),
        };
        let service = PortService::new(connector.clone(), MockContainers::with(inventory));
        let names = vec![CustomName::new(22, RuleProtocol::Any, "ssh")];

        let report = service
            .list_ports(&credentials(), Some(&api()), &names)
            .await
            .unwrap();

        assert!(report.ufw_active);
        assert!(report.warnings.is_empty());

        let ssh = report.find(22, Protocol::Tcp).unwrap();
        assert_eq!(ssh.state, PortState::OpenOnHost);
        assert_eq!(ssh.firewall_rules.len(), 1);
        assert_eq!(ssh.label.as_deref(), Some("ssh"));

        let web = report.find(8080, Protocol::Tcp).unwrap();
        assert_eq!(web.state, PortState::OpenInContainer);
        assert_eq!(web.container_ref.as_ref().unwrap().name, "web");

        assert_eq!(
            report.find(9000, Protocol::Udp).unwrap().state,
            PortState::FirewallOnly
        );
        assert!(report.find(68, Protocol::Udp).is_some());
        // two commands, each in its own session
        assert_eq!(connector.connects(), 2);
        assert_eq!(connector.disconnects(), 2);
    }

    #[tokio::test]
    async fn test_container_failure_becomes_warning() {
        let service = PortService::new(connector(), MockContainers::failing());

        let report = service
            .list_ports(&credentials(), Some(&api()), &[])
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("endpoint discovery failed"));
        assert!(report.find(22, Protocol::Tcp).is_some());
    }

    #[tokio::test]
    async fn test_endpoint_warnings_are_reported() {
        let inventory = ContainerInventory {
            mappings: Vec::new(),
            warnings: vec![EndpointWarning {
                endpoint_id: 2,
                endpoint_name: "edge".to_string(),
                reason: "HTTP 502".to_string(),
            }],
        };
        let service = PortService::new(connector(), MockContainers::with(inventory));

        let report = service
            .list_ports(&credentials(), Some(&api()), &[])
            .await
            .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("edge"));
    }

    #[tokio::test]
    async fn test_unconfigured_container_api_is_not_called() {
        let containers = MockContainers::with(ContainerInventory::empty());
        let service = PortService::new(connector(), containers);

        let report = service.list_ports(&credentials(), None, &[]).await.unwrap();
        assert_eq!(service.containers.calls(), 0);
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_session_failure_fails_listing() {
        let service = PortService::new(
            MockConnector::refusing(),
            MockContainers::with(ContainerInventory::empty()),
        );

        let result = service.list_ports(&credentials(), None, &[]).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_command_failure_fails_listing() {
        let connector = MockConnector::new()
            .respond(STATUS_COMMAND, STATUS)
            .fail(SOCKETS_COMMAND, "ss: command not found");
        let service = PortService::new(connector, MockContainers::failing());

        let result = service.list_ports(&credentials(), Some(&api()), &[]).await;
        assert!(matches!(result, Err(Error::Command { .. })));
    }

    #[tokio::test]
    async fn test_unparsed_counts_are_reported() {
        let connector = MockConnector::new()
            .respond(STATUS_COMMAND, "Status: active\n[ 1] abc ALLOW IN Anywhere\n")
            .respond(SOCKETS_COMMAND, "tcp LISTEN 0\n");
        let service = PortService::new(connector, MockContainers::failing());

        let report = service.list_ports(&credentials(), None, &[]).await.unwrap();
        assert_eq!(report.unparsed_lines.firewall, 1);
        assert_eq!(report.unparsed_lines.sockets, 1);
        assert!(report.ports.is_empty());
    }
}
