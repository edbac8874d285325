//! SSH session adapter built on russh.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ports::{RemoteSession, SessionConnector, SshAuth, SshCredentials};

/// Client handler that accepts any server host key.
struct AcceptingHandler;

#[async_trait]
impl client::Handler for AcceptingHandler {
    type Error = russh::Error;

    // TODO: check against a known_hosts file once settings can carry one.
    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Opens authenticated SSH sessions.
#[derive(Debug, Clone, Default)]
pub struct SshConnector;

impl SshConnector {
    pub fn new() -> Self {
        Self
    }

    async fn open(&self, credentials: &SshCredentials) -> Result<Handle<AcceptingHandler>> {
        let config = Arc::new(client::Config::default());
        let mut handle = client::connect(
            config,
            (credentials.host.as_str(), credentials.port),
            AcceptingHandler,
        )
        .await
        .map_err(|e| Error::Connection(format!("{}: {}", credentials.target(), e)))?;

        let authenticated = match &credentials.auth {
            SshAuth::Password(password) => handle
                .authenticate_password(credentials.username.as_str(), password.as_str())
                .await
                .map_err(|e| Error::Connection(format!("{}: {}", credentials.target(), e)))?,
            SshAuth::PrivateKey { path, pem } => {
                let key = russh_keys::decode_secret_key(pem, None).map_err(|e| {
                    Error::Config(format!("Failed to load SSH key at {}: {}", path.display(), e))
                })?;
                handle
                    .authenticate_publickey(credentials.username.as_str(), Arc::new(key))
                    .await
                    .map_err(|e| Error::Connection(format!("{}: {}", credentials.target(), e)))?
            }
        };

        if !authenticated {
            return Err(Error::Connection(format!(
                "{}: authentication rejected",
                credentials.target()
            )));
        }
        Ok(handle)
    }
}

impl SessionConnector for SshConnector {
    type Session = SshSession;

    async fn connect(&self, credentials: &SshCredentials) -> Result<SshSession> {
        let handle = tokio::time::timeout(credentials.connect_timeout, self.open(credentials))
            .await
            .map_err(|_| {
                Error::Timeout(format!(
                    "connecting to {} after {}s",
                    credentials.target(),
                    credentials.connect_timeout.as_secs()
                ))
            })??;

        let session = SshSession {
            id: Uuid::new_v4(),
            handle,
            command_timeout: credentials.command_timeout,
        };
        debug!(session = %session.id, target_host = %credentials.target(), "SSH session opened");
        Ok(session)
    }
}

/// One authenticated connection; each command runs on its own channel.
pub struct SshSession {
    id: Uuid,
    handle: Handle<AcceptingHandler>,
    command_timeout: Duration,
}

impl SshSession {
    async fn run(&mut self, command: &str) -> Result<String> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => exit_code = Some(exit_status),
                _ => {}
            }
        }

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        match exit_code {
            Some(0) => Ok(stdout),
            Some(exit_code) => {
                let stderr = String::from_utf8_lossy(&stderr).into_owned();
                let output = if stderr.trim().is_empty() { stdout } else { stderr };
                Err(Error::Command { exit_code, output })
            }
            None => Err(Error::Connection(format!(
                "channel closed without exit status: {}",
                command
            ))),
        }
    }
}

impl RemoteSession for SshSession {
    async fn execute(&mut self, command: &str) -> Result<String> {
        let timeout = self.command_timeout;
        tokio::time::timeout(timeout, self.run(command))
            .await
            .map_err(|_| {
                Error::Timeout(format!("'{}' after {}s", command, timeout.as_secs()))
            })?
    }

    async fn disconnect(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            warn!(session = %self.id, error = %e, "SSH disconnect failed");
        }
        debug!(session = %self.id, "SSH session closed");
    }
}
