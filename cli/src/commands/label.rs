//! Label commands - manage custom port names.

use anyhow::Result;
use portwarden_core::{DefaultPortWarden, RuleProtocol};

pub async fn set(
    engine: &DefaultPortWarden,
    port: u16,
    protocol: RuleProtocol,
    name: &str,
) -> Result<()> {
    engine.set_label(port, protocol, name).await?;
    if name.trim().is_empty() {
        println!("Removed label for {}/{}", port, protocol);
    } else {
        println!("Labeled {}/{} as '{}'", port, protocol, name.trim());
    }
    Ok(())
}

pub async fn remove(engine: &DefaultPortWarden, port: u16, protocol: RuleProtocol) -> Result<()> {
    engine.remove_label(port, protocol).await?;
    println!("Removed label for {}/{}", port, protocol);
    Ok(())
}
