//! Container port mapping domain models.

use serde::{Deserialize, Serialize};

use super::Protocol;

/// One port binding of one container, as reported by the container API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPortMapping {
    pub container_id: String,
    pub container_name: String,
    pub endpoint_id: i64,
    pub endpoint_name: String,
    pub private_port: u16,
    /// Host-side port. `None` means the port is not published.
    pub public_port: Option<u16>,
    #[serde(rename = "type")]
    pub protocol: Protocol,
}

impl ContainerPortMapping {
    /// Reference to the owning container, for attaching to a port entry.
    pub fn container_ref(&self) -> ContainerRef {
        ContainerRef {
            id: self.container_id.clone(),
            name: self.container_name.clone(),
            endpoint_name: self.endpoint_name.clone(),
        }
    }
}

/// Container identity attached to a reconciled port entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    pub id: String,
    pub name: String,
    pub endpoint_name: String,
}

/// An endpoint whose containers were left out of an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointWarning {
    pub endpoint_id: i64,
    pub endpoint_name: String,
    pub reason: String,
}

impl std::fmt::Display for EndpointWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "containers of endpoint '{}' ({}) omitted: {}",
            self.endpoint_name, self.endpoint_id, self.reason
        )
    }
}

/// Port mappings gathered across endpoints, plus what had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInventory {
    pub mappings: Vec<ContainerPortMapping>,
    pub warnings: Vec<EndpointWarning>,
}

impl ContainerInventory {
    pub fn empty() -> Self {
        Self::default()
    }
}
