//! Listening socket domain model.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Protocol;

fn users_regex() -> &'static Regex {
    static USERS: OnceLock<Regex> = OnceLock::new();
    USERS.get_or_init(|| {
        Regex::new(r#"users:\(\("(.+?)",pid=(\d+),fd=(\d+)\)"#).expect("valid users regex")
    })
}

/// A kernel-level listening (tcp) or bound (udp) socket on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListeningSocket {
    pub protocol: Protocol,
    pub port: u16,
    /// Local bind address without the port (e.g. "0.0.0.0", "[::]").
    pub address: String,
    /// Trailing process column of the socket listing, verbatim.
    pub process_descriptor: Option<String>,
}

impl ListeningSocket {
    pub fn new(
        protocol: Protocol,
        port: u16,
        address: impl Into<String>,
        process_descriptor: Option<String>,
    ) -> Self {
        Self {
            protocol,
            port,
            address: address.into(),
            process_descriptor,
        }
    }

    /// Process name from a `users:(("name",pid=…,fd=…))` descriptor.
    pub fn process_name(&self) -> Option<&str> {
        self.process_descriptor.as_deref().and_then(process_name)
    }
}

/// Extract the first process name from an `ss` process descriptor.
pub fn process_name(descriptor: &str) -> Option<&str> {
    users_regex()
        .captures(descriptor)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
