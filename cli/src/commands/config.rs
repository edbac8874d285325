//! Config commands - show and change settings.

use anyhow::{bail, Result};
use portwarden_core::{DefaultPortWarden, SETTING_KEYS};

pub async fn show(engine: &DefaultPortWarden, json: bool) -> Result<()> {
    let settings = engine.settings().await?.masked();
    let names = engine.custom_names().await?;

    if json {
        let output = serde_json::json!({
            "settings": settings,
            "customNames": names,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Settings:");
    for key in SETTING_KEYS {
        let value = settings.get(key)?.unwrap_or_default();
        println!("  {:<22} {}", key, value);
    }

    println!("\nCustom names:");
    if names.is_empty() {
        println!("  (none)");
    } else {
        for name in &names {
            println!("  {}/{}: {}", name.port, name.protocol, name.label);
        }
    }

    Ok(())
}

pub async fn set(engine: &DefaultPortWarden, key: &str, value: &str) -> Result<()> {
    if !SETTING_KEYS.contains(&key) {
        bail!(
            "unknown setting '{}' (expected one of: {})",
            key,
            SETTING_KEYS.join(", ")
        );
    }
    engine.update_setting(key, value).await?;
    println!("Updated {}", key);
    Ok(())
}
