//! `autoapprove log` — show what was auto-approved.
//!
//! Entries print oldest first, so the most recent approval is at the bottom.

use crate::audit::AuditEntry;
use crate::cli::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;

/// Run the `autoapprove log` command.
pub fn run_log(ctx: &Context, limit: Option<usize>, clear: bool) -> Result<()> {
    let audit = ctx.audit_log();

    if clear {
        audit.clear().context("Failed to clear audit log")?;
        println!("  {} Audit log cleared", "✓".green().bold());
        return Ok(());
    }

    let entries = audit.entries().context("Failed to read audit log")?;
    if entries.is_empty() {
        println!();
        println!("  {} Nothing has been auto-approved yet.", "ℹ".blue());
        println!();
        return Ok(());
    }

    let shown = match limit {
        Some(n) if n < entries.len() => &entries[entries.len() - n..],
        _ => &entries[..],
    };

    println!();
    println!(
        "  {} {} of {} entries (max {})",
        "Audit log:".bold(),
        shown.len(),
        entries.len(),
        audit.capacity()
    );
    println!();
    for entry in shown {
        println!("{}", format_entry(entry));
    }
    println!();

    Ok(())
}

/// Format one entry for terminal output.
pub fn format_entry(entry: &AuditEntry) -> String {
    let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let mut target = entry.resource.clone();
    if let Some(ref repo) = entry.repository {
        target = format!("{} {}", target, repo);
    }
    if let Some(ref path) = entry.file_path {
        target = format!("{}:{}", target, path);
    }
    format!(
        "  {} {} {:<7} {:<7} {}  {}",
        time.to_string().dimmed(),
        "✓".green(),
        entry.provider,
        entry.operation.to_string(),
        target,
        format!("[{} after {}s]", entry.rule.repo_pattern, entry.rule.delay).dimmed()
    )
}
