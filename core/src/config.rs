//! Settings and custom label persistence.
//!
//! Stores configuration in JSON format at `~/.portwarden/settings.json`.
//! Every read goes to disk, so edits made by another process are picked up
//! by the next operation.

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{CustomName, RuleProtocol};
use crate::error::{Error, Result};
use crate::ports::{ContainerApiConfig, SettingsRepository};

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "PORTWARDEN_CONFIG";

/// Keys accepted by [`Settings::set`] and [`Settings::get`].
pub const SETTING_KEYS: [&str; 9] = [
    "host_ip",
    "ssh_username",
    "ssh_password",
    "ssh_key_path",
    "ssh_port",
    "portainer_url",
    "portainer_token",
    "connect_timeout_secs",
    "command_timeout_secs",
];

const MASK: &str = "********";

/// Connection settings for the managed host and its container API.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub host_ip: Option<String>,

    #[serde(default)]
    pub ssh_username: Option<String>,

    /// Takes precedence over `ssh_key_path` when set.
    #[serde(default)]
    pub ssh_password: Option<String>,

    #[serde(default)]
    pub ssh_key_path: Option<String>,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Absent disables the container source.
    #[serde(default)]
    pub portainer_url: Option<String>,

    #[serde(default)]
    pub portainer_token: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host_ip: None,
            ssh_username: None,
            ssh_password: None,
            ssh_key_path: None,
            ssh_port: default_ssh_port(),
            portainer_url: None,
            portainer_token: None,
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

/// Treat `Some("")` and whitespace-only values as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl Settings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }

    /// Container API location, or `None` when no URL is configured.
    pub fn container_api(&self) -> Option<ContainerApiConfig> {
        let url = non_empty(&self.portainer_url)?;
        Some(ContainerApiConfig {
            base_url: url.trim_end_matches('/').to_string(),
            token: non_empty(&self.portainer_token).map(str::to_string),
            timeout: self.command_timeout(),
        })
    }

    /// Read a setting by key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "host_ip" => self.host_ip.clone(),
            "ssh_username" => self.ssh_username.clone(),
            "ssh_password" => self.ssh_password.clone(),
            "ssh_key_path" => self.ssh_key_path.clone(),
            "ssh_port" => Some(self.ssh_port.to_string()),
            "portainer_url" => self.portainer_url.clone(),
            "portainer_token" => self.portainer_token.clone(),
            "connect_timeout_secs" => Some(self.connect_timeout_secs.to_string()),
            "command_timeout_secs" => Some(self.command_timeout_secs.to_string()),
            other => return Err(Error::Config(format!("Unknown setting '{}'", other))),
        };
        Ok(value)
    }

    /// Update a setting by key. An empty value clears optional settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "host_ip" => self.host_ip = optional(value),
            "ssh_username" => self.ssh_username = optional(value),
            "ssh_password" => self.ssh_password = optional(value),
            "ssh_key_path" => self.ssh_key_path = optional(value),
            "ssh_port" => self.ssh_port = parse_number(key, value)?,
            "portainer_url" => self.portainer_url = optional(value),
            "portainer_token" => self.portainer_token = optional(value),
            "connect_timeout_secs" => self.connect_timeout_secs = parse_number(key, value)?,
            "command_timeout_secs" => self.command_timeout_secs = parse_number(key, value)?,
            other => return Err(Error::Config(format!("Unknown setting '{}'", other))),
        }
        Ok(())
    }

    /// Copy with secrets replaced, for display.
    pub fn masked(&self) -> Self {
        let mask = |v: &Option<String>| non_empty(v).map(|_| MASK.to_string());
        Self {
            ssh_password: mask(&self.ssh_password),
            portainer_token: mask(&self.portainer_token),
            ..self.clone()
        }
    }
}

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(flatten)]
    pub settings: Settings,

    #[serde(default, rename = "customNames")]
    pub custom_names: Vec<CustomName>,
}

impl StoredConfig {
    fn upsert_name(&mut self, name: CustomName) {
        match self
            .custom_names
            .iter_mut()
            .find(|n| n.is_keyed(name.port, name.protocol))
        {
            Some(existing) => existing.label = name.label,
            None => self.custom_names.push(name),
        }
    }

    fn remove_name(&mut self, port: u16, protocol: RuleProtocol) {
        self.custom_names.retain(|n| !n.is_keyed(port, protocol));
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// File-backed settings store.
pub struct SettingsStore {
    /// Path to the settings file.
    config_path: PathBuf,
}

impl SettingsStore {
    /// Create a store at `$PORTWARDEN_CONFIG`, or `~/.portwarden/settings.json`.
    pub fn new() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portwarden").join("settings.json"),
        })
    }

    /// Create a store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the whole file. Returns defaults if the file doesn't exist.
    pub async fn load(&self) -> Result<StoredConfig> {
        if !self.config_path.exists() {
            return Ok(StoredConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read settings: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse settings: {}", e)))
    }

    /// Save the whole file, creating its directory if needed.
    pub async fn save(&self, config: &StoredConfig) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize settings: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp settings file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write settings: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync settings: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename settings file: {}", e)))?;

        Ok(())
    }
}

impl SettingsRepository for SettingsStore {
    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.load().await?.settings)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut config = self.load().await?;
        config.settings = settings.clone();
        self.save(&config).await
    }

    async fn custom_names(&self) -> Result<Vec<CustomName>> {
        Ok(self.load().await?.custom_names)
    }

    async fn set_custom_name(&self, name: CustomName) -> Result<()> {
        let mut config = self.load().await?;
        config.upsert_name(name);
        self.save(&config).await
    }

    async fn delete_custom_name(&self, port: u16, protocol: RuleProtocol) -> Result<()> {
        let mut config = self.load().await?;
        config.remove_name(port, protocol);
        self.save(&config).await
    }
}

// ============================================================================
// MemorySettings
// ============================================================================

/// In-memory settings store for embedding and tests.
#[derive(Default)]
pub struct MemorySettings {
    config: RwLock<StoredConfig>,
}

impl MemorySettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            config: RwLock::new(StoredConfig {
                settings,
                custom_names: Vec::new(),
            }),
        }
    }
}

impl SettingsRepository for MemorySettings {
    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.config.read().settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.config.write().settings = settings.clone();
        Ok(())
    }

    async fn custom_names(&self) -> Result<Vec<CustomName>> {
        Ok(self.config.read().custom_names.clone())
    }

    async fn set_custom_name(&self, name: CustomName) -> Result<()> {
        self.config.write().upsert_name(name);
        Ok(())
    }

    async fn delete_custom_name(&self, port: u16, protocol: RuleProtocol) -> Result<()> {
        self.config.write().remove_name(port, protocol);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn test_store() -> (SettingsStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        (SettingsStore::with_path(path), dir)
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store().await;
        let config = store.load().await.unwrap();
        assert_eq!(config.settings, Settings::default());
        assert!(config.custom_names.is_empty());
        assert_eq!(config.settings.ssh_port, 22);
    }

    #[tokio::test]
    async fn test_save_and_load_settings() {
        let (store, _dir) = test_store().await;

        let mut settings = Settings::default();
        settings.set("host_ip", "10.0.0.2").unwrap();
        settings.set("ssh_username", "root").unwrap();
        settings.set("ssh_port", "2222").unwrap();
        store.save_settings(&settings).await.unwrap();

        let loaded = store.load_settings().await.unwrap();
        assert_eq!(loaded.host_ip.as_deref(), Some("10.0.0.2"));
        assert_eq!(loaded.ssh_port, 2222);
    }

    #[tokio::test]
    async fn test_file_uses_setting_keys() {
        let (store, _dir) = test_store().await;
        tokio::fs::write(
            store.config_path(),
            r#"{
                "host_ip": "172.17.0.1",
                "ssh_username": "root",
                "ssh_password": "",
                "portainer_url": "http://localhost:9000/",
                "customNames": [{"port": 53, "protocol": "any", "name": "dns"}]
            }"#,
        )
        .await
        .unwrap();

        let config = store.load().await.unwrap();
        assert_eq!(config.settings.host_ip.as_deref(), Some("172.17.0.1"));
        assert_eq!(non_empty(&config.settings.ssh_password), None);
        assert_eq!(config.custom_names[0].label, "dns");

        let api = config.settings.container_api().unwrap();
        assert_eq!(api.base_url, "http://localhost:9000");
        assert_eq!(api.token, None);
    }

    #[tokio::test]
    async fn test_custom_names() {
        let (store, _dir) = test_store().await;

        store
            .set_custom_name(CustomName::new(80, RuleProtocol::Tcp, "web"))
            .await
            .unwrap();
        store
            .set_custom_name(CustomName::new(80, RuleProtocol::Tcp, "nginx"))
            .await
            .unwrap();
        store
            .set_custom_name(CustomName::new(80, RuleProtocol::Any, "http"))
            .await
            .unwrap();

        let names = store.custom_names().await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].label, "nginx");

        store.delete_custom_name(80, RuleProtocol::Tcp).await.unwrap();
        let names = store.custom_names().await.unwrap();
        assert_eq!(names, vec![CustomName::new(80, RuleProtocol::Any, "http")]);
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let (store, _dir) = test_store().await;
        tokio::fs::write(store.config_path(), "{ not json").await.unwrap();
        assert!(matches!(store.load().await, Err(Error::Config(_))));
    }

    #[test]
    fn test_set_unknown_key() {
        let mut settings = Settings::default();
        assert!(settings.set("jwt_secret", "x").is_err());
        assert!(settings.set("ssh_port", "twenty-two").is_err());
    }

    #[test]
    fn test_masked() {
        let mut settings = Settings::default();
        settings.set("ssh_password", "hunter2").unwrap();
        let masked = settings.masked();
        assert_eq!(masked.ssh_password.as_deref(), Some(MASK));
        assert_eq!(masked.portainer_token, None);
    }

    #[test]
    fn test_memory_settings() {
        let store = MemorySettings::new(Settings::default());
        tokio_test::block_on(async {
            store
                .set_custom_name(CustomName::new(22, RuleProtocol::Tcp, "ssh"))
                .await
                .unwrap();
            assert_eq!(store.custom_names().await.unwrap().len(), 1);

            store.delete_custom_name(22, RuleProtocol::Tcp).await.unwrap();
            assert!(store.custom_names().await.unwrap().is_empty());
        });
    }
}
