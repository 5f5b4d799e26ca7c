//! `autoapprove check` — validate and lint a config.

use crate::cli::Context;
use crate::policy::defaults::CONFIG_KEY;
use crate::policy::linter::lint_config;
use crate::policy::validate::parse_config;
use crate::storage::Storage;
use anyhow::{Context as _, Result};
use colored::Colorize;
use std::path::Path;

/// Check a config file, or the stored config when no file is given.
pub fn run_check(ctx: &Context, file: Option<&Path>) -> Result<()> {
    let (text, source) = match file {
        Some(path) => (
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            path.display().to_string(),
        ),
        None => match ctx.storage().get(CONFIG_KEY)? {
            Some(text) => (text, format!("stored config for {}", ctx.origin)),
            None => {
                println!();
                println!("  {} No stored config for {}.", "ℹ".blue(), ctx.origin);
                println!("  Create one with: {}", "autoapprove init".dimmed());
                println!();
                return Ok(());
            }
        },
    };

    let config = parse_config(&text).with_context(|| format!("{} is not usable", source))?;

    println!();
    println!("  {} Config is valid!", "✓".green().bold());
    println!("  Source:  {}", source.dimmed());
    println!(
        "  Enabled: {}",
        if config.enabled {
            "yes".green()
        } else {
            "no".red()
        }
    );
    println!("  Default delay: {}s", config.default_delay);
    for provider in &config.providers {
        println!();
        println!("  {}", provider.name.cyan());
        for (i, rule) in provider.rules.iter().enumerate() {
            println!("    {}. {}", i + 1, rule.describe());
        }
    }

    let warnings = lint_config(&config);
    if warnings.is_empty() {
        println!();
        println!("  {} No issues found.", "✓".green());
    } else {
        println!();
        println!(
            "  {} {} {}:",
            "─".repeat(20).dimmed(),
            warnings.len(),
            if warnings.len() == 1 {
                "suggestion"
            } else {
                "suggestions"
            }
        );
        println!();
        for warning in &warnings {
            println!("{}", warning.display());
        }
    }
    println!();

    Ok(())
}
