//! Container source port (interface).

use std::time::Duration;

use crate::domain::ContainerInventory;
use crate::error::Result;

/// Where and how to reach the container management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerApiConfig {
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// Port for discovering published container ports.
pub trait ContainerSource: Send + Sync {
    /// Gather port mappings across every reachable endpoint.
    ///
    /// Failure to list endpoints is an `Error::ExternalService`; failures of
    /// individual endpoints are reported as inventory warnings instead.
    fn fetch(
        &self,
        api: &ContainerApiConfig,
    ) -> impl std::future::Future<Output = Result<ContainerInventory>> + Send;
}
