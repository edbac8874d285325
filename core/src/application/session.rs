//! Session lifecycle helpers.
//!
//! Every logical operation opens its own session and closes it again on
//! every exit path; sessions are never pooled or shared between requests.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{non_empty, Settings};
use crate::error::{Error, Result};
use crate::ports::{RemoteSession, SessionConnector, SshAuth, SshCredentials};

/// Resolve credentials from settings before any network traffic.
///
/// A password wins over a key path; the key file is read here so an
/// unreadable key fails fast with the path in the message.
pub async fn resolve_credentials(settings: &Settings) -> Result<SshCredentials> {
    let (Some(host), Some(username)) = (
        non_empty(&settings.host_ip),
        non_empty(&settings.ssh_username),
    ) else {
        return Err(Error::Config(
            "SSH settings incomplete: Host IP and Username are required".to_string(),
        ));
    };

    let auth = if let Some(password) = non_empty(&settings.ssh_password) {
        SshAuth::Password(password.to_string())
    } else if let Some(key_path) = non_empty(&settings.ssh_key_path) {
        let path = PathBuf::from(key_path);
        let pem = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::Config(format!("Failed to read SSH key at {}: {}", path.display(), e))
        })?;
        SshAuth::PrivateKey { path, pem }
    } else {
        return Err(Error::Config(
            "SSH settings incomplete: Password or Key Path missing".to_string(),
        ));
    };

    Ok(SshCredentials {
        host: host.to_string(),
        port: settings.ssh_port,
        username: username.to_string(),
        auth,
        connect_timeout: settings.connect_timeout(),
        command_timeout: settings.command_timeout(),
    })
}

/// Open a session, run one command, and disconnect.
pub async fn execute_once<C: SessionConnector>(
    connector: &C,
    credentials: &SshCredentials,
    command: &str,
) -> Result<String> {
    let mut outputs = execute_all(connector, credentials, &[command]).await?;
    Ok(outputs.pop().unwrap_or_default())
}

/// Open a session, run commands in order, and disconnect.
///
/// Stops at the first failing command. The session is closed whether the
/// sequence succeeded or not.
pub async fn execute_all<C: SessionConnector>(
    connector: &C,
    credentials: &SshCredentials,
    commands: &[&str],
) -> Result<Vec<String>> {
    let mut session = connector.connect(credentials).await?;

    let mut outputs = Vec::with_capacity(commands.len());
    let mut result = Ok(());
    for command in commands {
        debug!(target_host = %credentials.target(), command = %command, "Executing remote command");
        match session.execute(command).await {
            Ok(output) => outputs.push(output),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    session.disconnect().await;
    result.map(|_| outputs)
}
