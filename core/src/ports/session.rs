//! Remote session port (interface).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// How to authenticate against the remote host.
#[derive(Clone)]
pub enum SshAuth {
    Password(String),
    /// Key material already read from `path`.
    PrivateKey { path: PathBuf, pem: String },
}

impl std::fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SshAuth::Password(_) => f.write_str("Password(***)"),
            SshAuth::PrivateKey { path, .. } => f
                .debug_struct("PrivateKey")
                .field("path", path)
                .finish_non_exhaustive(),
        }
    }
}

/// Everything needed to open one session.
#[derive(Debug, Clone)]
pub struct SshCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: SshAuth,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
}

impl SshCredentials {
    /// `user@host:port`, for logs and error messages.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

/// An authenticated command-execution session.
///
/// A session belongs to the single command sequence that opened it.
/// `disconnect` consumes it, so it cannot be used afterwards.
pub trait RemoteSession: Send {
    /// Run a command and return its stdout.
    ///
    /// A non-zero exit status fails with `Error::Command`.
    fn execute(&mut self, command: &str) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Close the session. Failures are logged, not returned.
    fn disconnect(self) -> impl std::future::Future<Output = ()> + Send;
}

/// Port for opening remote sessions.
pub trait SessionConnector: Send + Sync {
    type Session: RemoteSession;

    /// Open and authenticate a new session.
    fn connect(
        &self,
        credentials: &SshCredentials,
    ) -> impl std::future::Future<Output = Result<Self::Session>> + Send;
}
