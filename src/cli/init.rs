//! `autoapprove init` — write the default config for an origin.
//!
//! The defaults auto-approve creates and updates to docs and scripts in
//! `owner/*` after a 2s cancellable countdown, and keep deletes manual.

use crate::cli::Context;
use crate::policy::defaults::{default_config, CONFIG_KEY};
use crate::storage::{self, Storage};
use anyhow::{Context as _, Result};
use colored::Colorize;

/// Run the `autoapprove init` command.
pub fn run_init(ctx: &Context, force: bool) -> Result<()> {
    let storage = ctx.storage();

    if !force && storage.get(CONFIG_KEY)?.is_some() {
        println!(
            "  {} A config already exists for {}",
            "⚠".yellow(),
            ctx.origin.cyan()
        );
        println!("  Use --force to reset it to the defaults.");
        return Ok(());
    }

    let config = default_config();
    storage::store_json(storage.as_ref(), CONFIG_KEY, &config)
        .context("Failed to write default config")?;

    println!();
    println!(
        "  {} Wrote default config for {}",
        "✓".green().bold(),
        ctx.origin.bold()
    );
    println!("  {}", storage.dir().display().to_string().dimmed());
    println!();
    println!("  {} What this config does:", "ℹ".blue());
    println!("    • Auto-approves GitHub creates/updates to docs/, scripts/ and *.md in owner/*");
    println!("    • Waits 2s with a countdown you can cancel (Esc or c)");
    println!("    • Never auto-approves deletes");
    println!();
    println!("  {} Next steps:", "→".blue());
    println!("    1. Review the rules: {}", "autoapprove show".dimmed());
    println!(
        "    2. Try a call: {}",
        "autoapprove eval github create --repo owner/repo --path docs/x.md".dimmed()
    );
    println!("    3. See what was approved: {}", "autoapprove log".dimmed());
    println!();

    Ok(())
}
