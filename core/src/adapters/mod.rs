//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

mod portainer;
mod ssh;

pub use portainer::PortainerClient;
pub use ssh::{SshConnector, SshSession};
