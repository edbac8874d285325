//! PortWarden Core Library
//!
//! Reconciles the exposure state of one remote Linux host:
//! - Listening sockets reported by `ss -tulpn`
//! - Firewall rules reported by `ufw status numbered`
//! - Published container ports reported by the Portainer API
//!
//! and changes that state by adding or deleting ufw rules over SSH.
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models and the reconciliation merge
//! - `parsers`: Pure text parsers for the remote command output
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: SSH and Portainer implementations
//! - `application`: Use case services
//! - `engine`: Operation surface reading settings fresh per call

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod parsers;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{
    ContainerPortMapping, ContainerRef, CustomName, FirewallRule, FirewallStatus,
    ListeningSocket, PortKey, PortState, PortsReport, Protocol, RuleId, RuleProtocol,
    UnifiedPortEntry,
};

// Re-export other commonly used types
pub use config::{Settings, SettingsStore, SETTING_KEYS};
pub use engine::{DefaultPortWarden, PortWarden};
pub use error::{Error, Result};
