//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod containers;
mod session;
mod settings;

pub use containers::{ContainerApiConfig, ContainerSource};
pub use session::{RemoteSession, SessionConnector, SshAuth, SshCredentials};
pub use settings::SettingsRepository;
