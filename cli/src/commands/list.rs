//! List command - show the unified port view.

use anyhow::Result;
use chrono::Local;
use portwarden_core::domain::process_name;
use portwarden_core::{DefaultPortWarden, UnifiedPortEntry};

use super::truncate;

fn owner(entry: &UnifiedPortEntry) -> String {
    if let Some(container) = &entry.container_ref {
        return format!("{} ({})", container.name, container.endpoint_name);
    }
    entry
        .process_descriptor
        .as_deref()
        .map(|d| process_name(d).unwrap_or(d).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn rules(entry: &UnifiedPortEntry) -> String {
    if entry.firewall_rules.is_empty() {
        return "-".to_string();
    }
    entry
        .firewall_rules
        .iter()
        .map(|r| format!("[{}] {}", r.rule_id, r.action))
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn run(engine: &DefaultPortWarden, port_filter: Option<u16>, json: bool) -> Result<()> {
    let mut report = engine.list_ports().await?;

    if let Some(p) = port_filter {
        report.ports.retain(|entry| entry.port == p);
    }

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.ufw_active {
        eprintln!("warning: ufw is inactive; rules are not enforced");
    }

    if report.ports.is_empty() {
        println!("No ports found.");
        return Ok(());
    }

    // Table header
    println!(
        "{:<6} {:<6} {:<18} {:<24} {:<24} LABEL",
        "PORT", "PROTO", "STATE", "PROCESS/CONTAINER", "RULES"
    );
    println!("{}", "-".repeat(90));

    for entry in &report.ports {
        println!(
            "{:<6} {:<6} {:<18} {:<24} {:<24} {}",
            entry.port,
            entry.protocol,
            entry.state.display_name(),
            truncate(&owner(entry), 24),
            truncate(&rules(entry), 24),
            entry.label.as_deref().unwrap_or("")
        );
    }

    let skipped = report.unparsed_lines.firewall + report.unparsed_lines.sockets;
    println!(
        "\nTotal: {} ports ({} unrecognized lines) at {}",
        report.ports.len(),
        skipped,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}
