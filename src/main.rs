//! autoapprove — rule-driven auto-approval for MCP tool calls.
//!
//! Quick start:
//!   autoapprove init        # write the default rules
//!   autoapprove show        # see what gets auto-approved
//!   autoapprove log         # see what was auto-approved
//!
//! For more info: autoapprove --help

use autoapprove::cli::{self, Context, DEFAULT_ORIGIN};
use autoapprove::policy::defaults::DEFAULT_APPROVAL_LABELS;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

/// autoapprove — approve routine MCP tool calls for you.
///
/// Calls matching your rules are approved after a short countdown you can
/// cancel. Deletes are never approved unless a rule says so explicitly.
#[derive(Parser)]
#[command(
    name = "autoapprove",
    version,
    about = "Rule-driven auto-approval for MCP tool calls",
    long_about = "autoapprove watches for MCP tool calls, checks them against your\n\
                  rules, and presses Approve for you after a cancellable countdown.\n\n\
                  Quick start:\n  \
                  autoapprove init       # write the default rules\n  \
                  autoapprove show       # see what gets auto-approved\n  \
                  autoapprove log        # see what was auto-approved"
)]
struct Cli {
    /// Storage directory
    #[arg(long, global = true, env = "AUTOAPPROVE_HOME")]
    home: Option<PathBuf>,

    /// Site whose config and audit log to use
    #[arg(long, global = true, env = "AUTOAPPROVE_ORIGIN", default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Approval button label (repeatable)
    #[arg(long = "label", global = true)]
    labels: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show the active rules
    Show,

    /// Validate and lint a config file (or the stored config)
    Check {
        /// Path to a config JSON file
        file: Option<PathBuf>,
    },

    /// Dry-run a call against the rules
    Eval {
        /// Provider, e.g. github
        provider: Option<String>,

        /// create, update, delete or read
        operation: Option<String>,

        #[arg(long)]
        repo: Option<String>,

        #[arg(long)]
        path: Option<String>,

        /// Raw MCP request body instead of the fields above
        #[arg(long, conflicts_with_all = ["provider", "operation", "repo", "path"])]
        body: Option<String>,
    },

    /// Print the config as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the config with an exported one
    Import {
        file: PathBuf,
    },

    /// Turn auto-approval on
    Enable,

    /// Turn auto-approval off
    Disable,

    /// See what was auto-approved
    Log {
        /// Show only the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Delete all entries
        #[arg(long)]
        clear: bool,
    },

    /// Feed recorded traffic through the interceptor and approve against a page
    Replay {
        /// JSON-lines traffic file
        traffic: PathBuf,

        /// Page description (JSON element tree)
        #[arg(long)]
        page: Option<PathBuf>,

        /// No terminal countdown; notifications go to the log
        #[arg(long)]
        headless: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("autoapprove=warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!();
        eprintln!("  {} {}", "✗".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".dimmed(), cause);
        }
        eprintln!();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let labels = if cli.labels.is_empty() {
        DEFAULT_APPROVAL_LABELS.iter().map(|l| l.to_string()).collect()
    } else {
        cli.labels
    };
    let ctx = Context::new(cli.home, cli.origin, labels)?;

    match cli.command {
        Commands::Init { force } => cli::init::run_init(&ctx, force),
        Commands::Show => cli::config::run_show(&ctx),
        Commands::Check { file } => cli::check::run_check(&ctx, file.as_deref()),
        Commands::Eval {
            provider,
            operation,
            repo,
            path,
            body,
        } => cli::eval::run_eval(
            &ctx,
            &cli::eval::EvalArgs {
                provider,
                operation,
                repo,
                path,
                body,
            },
        ),
        Commands::Export { output } => cli::config::run_export(&ctx, output.as_deref()),
        Commands::Import { file } => cli::config::run_import(&ctx, &file),
        Commands::Enable => cli::config::run_set_enabled(&ctx, true),
        Commands::Disable => cli::config::run_set_enabled(&ctx, false),
        Commands::Log { limit, clear } => cli::log::run_log(&ctx, limit, clear),
        Commands::Replay {
            traffic,
            page,
            headless,
        } => {
            cli::replay::run_replay(
                &ctx,
                &cli::replay::ReplayOptions {
                    traffic,
                    page,
                    headless,
                },
            )
            .await
        }
    }
}
