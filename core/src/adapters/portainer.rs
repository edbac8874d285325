//! Portainer API adapter.
//!
//! Lists the environments ("endpoints") Portainer manages and, for each one
//! that is up, the containers of its Docker engine via the proxied
//! `/docker/containers/json` route.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::domain::{ContainerInventory, ContainerPortMapping, EndpointWarning, Protocol};
use crate::error::{Error, Result};
use crate::ports::{ContainerApiConfig, ContainerSource};

const API_KEY_HEADER: &str = "X-API-Key";
const ENDPOINT_UP: i64 = 1;
const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Endpoint {
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: i64,
}

/// Docker reports `null` instead of `[]` for some containers.
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Container {
    id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    names: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    ports: Vec<PortBinding>,
}

#[derive(Debug, Deserialize)]
struct PortBinding {
    #[serde(rename = "IP", default)]
    ip: Option<String>,
    #[serde(rename = "PrivatePort")]
    private_port: u16,
    #[serde(rename = "PublicPort", default)]
    public_port: Option<u16>,
    #[serde(rename = "Type")]
    kind: String,
}

impl Container {
    /// First name without Docker's leading slash, else the short id.
    fn display_name(&self) -> String {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.id.chars().take(SHORT_ID_LEN).collect())
    }
}

/// Flatten one endpoint's containers into port mappings.
///
/// Bindings with an unknown protocol are skipped. Identical mappings, as
/// Docker reports once per bound address family, are kept once.
fn flatten_containers(endpoint: &Endpoint, containers: &[Container]) -> Vec<ContainerPortMapping> {
    let mut seen = HashSet::new();
    let mut mappings = Vec::new();

    for container in containers {
        let name = container.display_name();
        for binding in &container.ports {
            let Ok(protocol) = binding.kind.parse::<Protocol>() else {
                debug!(container = %name, kind = %binding.kind, "Skipping unsupported port type");
                continue;
            };
            if !seen.insert((
                container.id.as_str(),
                binding.private_port,
                binding.public_port,
                protocol,
            )) {
                continue;
            }
            debug!(
                container = %name,
                ip = binding.ip.as_deref().unwrap_or("-"),
                private_port = binding.private_port,
                "Container port binding"
            );

            mappings.push(ContainerPortMapping {
                container_id: container.id.clone(),
                container_name: name.clone(),
                endpoint_id: endpoint.id,
                endpoint_name: endpoint.name.clone(),
                private_port: binding.private_port,
                public_port: binding.public_port,
                protocol,
            });
        }
    }

    mappings
}

/// HTTP client for the Portainer API.
#[derive(Debug, Clone, Default)]
pub struct PortainerClient {
    http: reqwest::Client,
}

impl PortainerClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        api: &ContainerApiConfig,
        path: &str,
    ) -> std::result::Result<T, reqwest::Error> {
        let mut request = self
            .http
            .get(format!("{}{}", api.base_url, path))
            .timeout(api.timeout);
        if let Some(token) = &api.token {
            request = request.header(API_KEY_HEADER, token);
        }
        request.send().await?.error_for_status()?.json().await
    }
}

impl ContainerSource for PortainerClient {
    async fn fetch(&self, api: &ContainerApiConfig) -> Result<ContainerInventory> {
        let endpoints: Vec<Endpoint> = self
            .get_json(api, "/api/endpoints")
            .await
            .map_err(|e| Error::ExternalService(format!("listing endpoints: {}", e)))?;

        let mut inventory = ContainerInventory::empty();
        for endpoint in endpoints.iter().filter(|e| e.status == ENDPOINT_UP) {
            let path = format!("/api/endpoints/{}/docker/containers/json", endpoint.id);
            match self.get_json::<Vec<Container>>(api, &path).await {
                Ok(containers) => {
                    inventory
                        .mappings
                        .extend(flatten_containers(endpoint, &containers));
                }
                Err(e) => {
                    warn!(endpoint = %endpoint.name, error = %e, "Failed to fetch containers");
                    inventory.warnings.push(EndpointWarning {
                        endpoint_id: endpoint.id,
                        endpoint_name: endpoint.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(
            endpoints = endpoints.len(),
            mappings = inventory.mappings.len(),
            "Fetched container inventory"
        );
        Ok(inventory)
    }
}
