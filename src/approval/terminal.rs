//! Terminal feedback UI using crossterm.
//!
//! The countdown renders as a single updating line. While it runs, Esc or
//! `c` cancels it. Key handling runs on a blocking thread since crossterm
//! uses synchronous I/O; the countdown itself stays on the async side.

use crate::approval::countdown::{Countdowns, Ticket};
use crate::approval::types::{CountdownRequest, NoticeLevel};
use crate::approval::FeedbackUi;
use crate::policy::types::delay_duration;
use crate::policy::ConfigStore;
use async_trait::async_trait;
use colored::Colorize;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct TerminalUi {
    countdowns: Arc<Countdowns>,
}

impl TerminalUi {
    pub fn new(countdowns: Arc<Countdowns>) -> Self {
        Self { countdowns }
    }
}

#[async_trait]
impl FeedbackUi for TerminalUi {
    async fn show_countdown(&self, request: &CountdownRequest) -> bool {
        let ticket = self.countdowns.enqueue(request.call_id);
        let done = CancellationToken::new();

        let watcher = {
            let countdowns = self.countdowns.clone();
            let request = request.clone();
            let ticket = ticket.clone();
            let done = done.clone();
            tokio::task::spawn_blocking(move || watch_countdown(&countdowns, &request, &ticket, &done))
        };

        let outcome = self
            .countdowns
            .run_ticket(&ticket, delay_duration(request.seconds))
            .await;
        done.cancel();

        match watcher.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Countdown display failed: {}", e),
            Err(e) => tracing::debug!("Countdown display task failed: {}", e),
        }

        let cancelled = outcome.is_cancelled();
        if cancelled {
            println!("  {} Cancelled: {}", "✗".red(), request.summary);
        }
        cancelled
    }

    fn show_notification(&self, message: &str, level: NoticeLevel) {
        let icon = match level {
            NoticeLevel::Info => "ℹ".blue(),
            NoticeLevel::Success => "✓".green(),
            NoticeLevel::Warning => "⚠".yellow(),
            NoticeLevel::Error => "✗".red(),
        };
        println!("  {} {}", icon, message);
    }

    fn open_config_panel(&self, store: &ConfigStore) {
        let config = store.get_config();

        println!();
        println!(
            "  {}  {}",
            "MCP auto-approve".bold(),
            if config.enabled {
                "enabled".green()
            } else {
                "disabled".red()
            }
        );
        println!(
            "  {}",
            "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".dimmed()
        );
        println!("  Default delay: {}s", config.default_delay);

        for provider in &config.providers {
            println!();
            println!("  {} ({} rules)", provider.name.cyan(), provider.rules.len());
            for (i, rule) in provider.rules.iter().enumerate() {
                let ops = rule
                    .operations
                    .iter()
                    .map(|o| o.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                let verdict = if rule.auto_approve {
                    "auto".green()
                } else {
                    "manual".yellow()
                };
                let delay = rule
                    .delay
                    .map(|d| format!("{}s", d))
                    .unwrap_or_else(|| format!("{}s (default)", config.default_delay));
                println!(
                    "    {}. {:<7} {:<20} {:<22} delay {}{}",
                    i + 1,
                    verdict,
                    rule.repo_pattern,
                    ops,
                    delay,
                    if rule.require_confirmation {
                        ", confirm"
                    } else {
                        ""
                    }
                );
                if let Some(ref paths) = rule.path_patterns {
                    println!("       {}", format!("paths: {}", paths.join(", ")).dimmed());
                }
            }
        }
        println!();
    }

    fn cancel_active_countdown(&self) -> bool {
        self.countdowns.cancel_active()
    }
}

/// Render the countdown and watch for a cancel key until `done` fires.
fn watch_countdown(
    countdowns: &Countdowns,
    request: &CountdownRequest,
    ticket: &Ticket,
    done: &CancellationToken,
) -> anyhow::Result<()> {
    // Queued behind another countdown: wait without touching the terminal.
    while !countdowns.is_active(ticket) {
        if done.is_cancelled() {
            return Ok(());
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    let mut stdout = std::io::stdout();
    let started = Instant::now();
    let total = delay_duration(request.seconds);

    // Without a tty there are no keys to read; still render the line.
    let raw = terminal::enable_raw_mode().is_ok();

    let result = (|| -> anyhow::Result<()> {
        while !done.is_cancelled() {
            let remaining = total.saturating_sub(started.elapsed());
            execute!(
                stdout,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Yellow),
                Print(format!(
                    "  ⏳ Approving in {}s: {}",
                    remaining.as_secs() + u64::from(remaining.subsec_millis() > 0),
                    request.summary
                )),
                SetForegroundColor(Color::DarkGrey),
                Print("  [Esc/c] cancel"),
                ResetColor,
            )?;
            stdout.flush()?;

            if raw && event::poll(POLL_INTERVAL)? {
                if let Event::Key(KeyEvent { code, .. }) = event::read()? {
                    if matches!(code, KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('C')) {
                        ticket.token().cancel();
                    }
                }
            } else if !raw {
                std::thread::sleep(POLL_INTERVAL);
            }
        }
        Ok(())
    })();

    if raw {
        terminal::disable_raw_mode()?;
    }
    execute!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine)
    )?;
    stdout.flush()?;

    result
}
