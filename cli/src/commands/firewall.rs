//! Firewall commands - status, allow, delete and block.

use anyhow::Result;
use portwarden_core::{DefaultPortWarden, RuleProtocol};

pub async fn status(engine: &DefaultPortWarden, json: bool) -> Result<()> {
    let status = engine.firewall_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "Status: {}",
        if status.active { "active" } else { "inactive" }
    );
    if status.rules.is_empty() {
        println!("No rules.");
        return Ok(());
    }

    println!("{:<6} {:<8} {:<6} {:<14} FROM", "ID", "PORT", "PROTO", "ACTION");
    println!("{}", "-".repeat(60));
    for rule in &status.rules {
        println!(
            "{:<6} {:<8} {:<6} {:<14} {}",
            rule.rule_id, rule.port, rule.protocol, rule.action, rule.source
        );
    }
    if status.unparsed_lines > 0 {
        println!("\n{} lines not recognized", status.unparsed_lines);
    }
    Ok(())
}

pub async fn allow(engine: &DefaultPortWarden, port: u16, protocol: RuleProtocol) -> Result<()> {
    engine.allow_port(port, protocol).await?;
    println!("Allowed {}/{}", port, protocol);
    Ok(())
}

pub async fn delete(engine: &DefaultPortWarden, rule_id: u32) -> Result<()> {
    engine.remove_rule(rule_id).await?;
    println!("Deleted rule {}", rule_id);
    println!("Rule ids after it have shifted; run `portwarden status` before deleting again.");
    Ok(())
}

pub async fn block(engine: &DefaultPortWarden, port: u16, protocol: RuleProtocol) -> Result<()> {
    let removed = engine.block_port(port, protocol).await?;
    if removed.is_empty() {
        println!("No rules found for {}/{}", port, protocol);
    } else {
        let ids: Vec<String> = removed.iter().map(ToString::to_string).collect();
        println!("Blocked {}/{} (deleted rules {})", port, protocol, ids.join(", "));
    }
    Ok(())
}
