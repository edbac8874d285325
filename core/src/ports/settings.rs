//! Settings repository port (interface).

use crate::config::Settings;
use crate::domain::{CustomName, RuleProtocol};
use crate::error::Result;

/// Port for settings and custom label persistence.
///
/// Settings are read fresh at the start of every operation, so an
/// implementation must not hand out stale cached values.
pub trait SettingsRepository: Send + Sync {
    // =========================================================================
    // Settings
    // =========================================================================

    /// Load the connection settings.
    fn load_settings(&self) -> impl std::future::Future<Output = Result<Settings>> + Send;

    /// Replace the connection settings.
    fn save_settings(
        &self,
        settings: &Settings,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    // =========================================================================
    // Custom Names
    // =========================================================================

    /// Get all custom port labels.
    fn custom_names(&self) -> impl std::future::Future<Output = Result<Vec<CustomName>>> + Send;

    /// Insert or replace the label stored under `(port, protocol)`.
    fn set_custom_name(
        &self,
        name: CustomName,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove the label stored under `(port, protocol)`, if any.
    fn delete_custom_name(
        &self,
        port: u16,
        protocol: RuleProtocol,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
