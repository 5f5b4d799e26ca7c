//! `autoapprove show | export | import | enable | disable`.

use crate::approval::{Countdowns, FeedbackUi, TerminalUi};
use crate::cli::Context;
use anyhow::{Context as _, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// Print the active config as a table.
pub fn run_show(ctx: &Context) -> Result<()> {
    let store = ctx.config_store();
    TerminalUi::new(Arc::new(Countdowns::new())).open_config_panel(&store);
    Ok(())
}

/// Write the active config as pretty JSON to a file, or stdout.
pub fn run_export(ctx: &Context, output: Option<&Path>) -> Result<()> {
    let json = ctx.config_store().export_config();
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "  {} Exported config to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Replace the active config with one from a file.
pub fn run_import(ctx: &Context, input: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    ctx.config_store()
        .import_config(&text)
        .with_context(|| format!("Failed to import {}", input.display()))?;
    println!(
        "  {} Imported config from {}",
        "✓".green().bold(),
        input.display().to_string().bold()
    );
    Ok(())
}

/// Switch auto-approval on or off.
pub fn run_set_enabled(ctx: &Context, enabled: bool) -> Result<()> {
    ctx.config_store()
        .set_enabled(enabled)
        .context("Failed to update config")?;
    if enabled {
        println!("  {} Auto-approval enabled", "✓".green().bold());
    } else {
        println!("  {} Auto-approval disabled", "✓".green().bold());
    }
    Ok(())
}
