//! In-memory collaborators shared by the application tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::ContainerInventory;
use crate::error::{Error, Result};
use crate::ports::{
    ContainerApiConfig, ContainerSource, RemoteSession, SessionConnector, SshAuth,
    SshCredentials,
};

pub fn credentials() -> SshCredentials {
    SshCredentials {
        host: "10.0.0.2".to_string(),
        port: 22,
        username: "root".to_string(),
        auth: SshAuth::Password("secret".to_string()),
        connect_timeout: Duration::from_secs(1),
        command_timeout: Duration::from_secs(1),
    }
}

#[derive(Default)]
struct Journal {
    commands: Vec<String>,
    connects: usize,
    disconnects: usize,
}

/// Connector whose sessions answer commands from a canned table.
///
/// Commands without a canned answer succeed with empty output; commands
/// registered with `fail` exit with status 1.
#[derive(Clone, Default)]
pub struct MockConnector {
    outputs: Arc<Mutex<HashMap<String, String>>>,
    failures: Arc<Mutex<HashMap<String, String>>>,
    journal: Arc<Mutex<Journal>>,
    refuse: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose connect always fails.
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    pub fn respond(self, command: &str, output: &str) -> Self {
        self.outputs
            .lock()
            .insert(command.to_string(), output.to_string());
        self
    }

    pub fn fail(self, command: &str, output: &str) -> Self {
        self.failures
            .lock()
            .insert(command.to_string(), output.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.journal.lock().commands.clone()
    }

    pub fn connects(&self) -> usize {
        self.journal.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.journal.lock().disconnects
    }
}

pub struct MockSession {
    connector: MockConnector,
}

impl RemoteSession for MockSession {
    async fn execute(&mut self, command: &str) -> Result<String> {
        self.connector
            .journal
            .lock()
            .commands
            .push(command.to_string());

        if let Some(output) = self.connector.failures.lock().get(command) {
            return Err(Error::Command {
                exit_code: 1,
                output: output.clone(),
            });
        }
        Ok(self
            .connector
            .outputs
            .lock()
            .get(command)
            .cloned()
            .unwrap_or_default())
    }

    async fn disconnect(self) {
        self.connector.journal.lock().disconnects += 1;
    }
}

impl SessionConnector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, credentials: &SshCredentials) -> Result<MockSession> {
        if self.refuse {
            return Err(Error::Connection(format!(
                "{}: connection refused",
                credentials.target()
            )));
        }
        self.journal.lock().connects += 1;
        Ok(MockSession {
            connector: self.clone(),
        })
    }
}

/// Container source returning a fixed inventory, or failing discovery.
pub struct MockContainers {
    inventory: Option<ContainerInventory>,
    calls: Arc<Mutex<usize>>,
}

impl MockContainers {
    pub fn with(inventory: ContainerInventory) -> Self {
        Self {
            inventory: Some(inventory),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            inventory: None,
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl ContainerSource for MockContainers {
    async fn fetch(&self, _api: &ContainerApiConfig) -> Result<ContainerInventory> {
        *self.calls.lock() += 1;
        self.inventory
            .clone()
            .ok_or_else(|| Error::ExternalService("endpoint discovery failed".to_string()))
    }
}
