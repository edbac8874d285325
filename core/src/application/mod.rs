//! Application layer - Use case services.
//!
//! Services are thin orchestrators: they resolve nothing themselves, take
//! resolved credentials, open sessions through the `SessionConnector` port
//! and hand command output to the parsers and the reconciler.

mod firewall_service;
#[cfg(test)]
pub(crate) mod mock;
mod port_service;
mod session;

pub use firewall_service::{allow_command, delete_command, FirewallService, STATUS_COMMAND};
pub use port_service::{PortService, SOCKETS_COMMAND};
pub use session::{execute_all, execute_once, resolve_credentials};
