//! `autoapprove replay` — run recorded traffic through the full pipeline.
//!
//! Each line of the traffic file is one JSON event:
//!
//! ```text
//! {"kind":"request","url":"https://…/api/mcp/call","method":"POST","body":{…}}
//! {"kind":"socket","payload":{…}}
//! {"kind":"broadcast","message":{"type":"MCP_CALL","payload":{…}}}
//! ```
//!
//! Requests and socket frames go out through a loopback host network with
//! the interceptor installed; broadcast messages are posted on the shared
//! call channel. Calls are approved against a page description (or an empty
//! page, where every approval fails to find its button).

use crate::approval::page::{PageNode, StaticPage};
use crate::approval::{Countdowns, FeedbackUi, HeadlessUi, HostPage, TerminalUi};
use crate::cli::Context;
use crate::intercept::transport::MessageHandler;
use crate::intercept::{
    CallChannel, CallSink, Frame, HostNetwork, IncomingResponse, Interceptor, OutgoingRequest,
    RequestTransport, SocketTransport,
};
use crate::orchestrator::{Orchestrator, Outcome, RunSummary};
use crate::policy::defaults::BROADCAST_CHANNEL;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use colored::Colorize;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
pub struct ReplayOptions {
    pub traffic: PathBuf,
    pub page: Option<PathBuf>,
    pub headless: bool,
}

/// One recorded traffic event.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrafficEvent {
    Request {
        url: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default)]
        body: Option<Value>,
    },
    Socket {
        payload: Value,
    },
    Broadcast {
        message: Value,
    },
}

fn default_method() -> String {
    "POST".to_string()
}

/// Bodies may be recorded as JSON or as the raw string that was sent.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a traffic file. Blank lines and `#` comments are skipped.
pub fn parse_traffic(text: &str) -> Result<Vec<TrafficEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid traffic event on line {}", i + 1))
        })
        .collect()
}

/// Network that answers every request locally and swallows socket frames.
#[derive(Default)]
pub struct Loopback {
    requests: AtomicUsize,
    frames: AtomicUsize,
}

impl Loopback {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestTransport for Loopback {
    async fn fetch(&self, request: OutgoingRequest) -> Result<IncomingResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Loopback {} {}", request.method, request.url);
        Ok(IncomingResponse {
            status: 200,
            body: String::new(),
        })
    }
}

impl SocketTransport for Loopback {
    fn send(&self, _frame: Frame) -> Result<()> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_message(&self, _handler: MessageHandler) {}
}

fn load_page(path: Option<&Path>) -> Result<StaticPage> {
    match path {
        Some(path) => StaticPage::from_file(path),
        None => Ok(StaticPage::new(PageNode::new("body"))),
    }
}

/// Run the `autoapprove replay` command.
pub async fn run_replay(ctx: &Context, options: &ReplayOptions) -> Result<()> {
    let text = std::fs::read_to_string(&options.traffic)
        .with_context(|| format!("Failed to read traffic file: {}", options.traffic.display()))?;
    let events = parse_traffic(&text)?;
    let page: Arc<dyn HostPage> = Arc::new(load_page(options.page.as_deref())?);

    let countdowns = Arc::new(Countdowns::new());
    let ui: Arc<dyn FeedbackUi> = if options.headless {
        Arc::new(HeadlessUi::new(countdowns))
    } else {
        Arc::new(TerminalUi::new(countdowns))
    };

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(ctx.config_store()),
        Arc::new(ctx.audit_log()),
        ui.clone(),
        page,
        ctx.labels.clone(),
    ));

    let loopback = Arc::new(Loopback::default());
    let host = Arc::new(HostNetwork::new(loopback.clone(), loopback.clone()));
    let (sink, calls) = CallSink::channel();
    let interceptor = Interceptor::new(host.clone(), sink);
    interceptor.install();

    let channel = CallChannel::new(BROADCAST_CHANNEL);
    let shutdown = CancellationToken::new();
    let running = tokio::spawn(orchestrator.run(
        calls,
        Some(channel.subscribe()),
        shutdown.clone(),
    ));

    {
        let shutdown = shutdown.clone();
        let ui = ui.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ui.cancel_active_countdown();
                shutdown.cancel();
            }
        });
    }

    for event in &events {
        match event {
            TrafficEvent::Request { url, method, body } => {
                let mut request = OutgoingRequest::new(method.clone(), url.clone());
                if let Some(body) = body {
                    request = request.with_body(raw_text(body));
                }
                if let Err(e) = host.request_transport().fetch(request).await {
                    tracing::warn!("Request to {} failed: {}", url, e);
                }
            }
            TrafficEvent::Socket { payload } => {
                if let Err(e) = host.socket_transport().send(Frame::Text(raw_text(payload))) {
                    tracing::warn!("Socket send failed: {}", e);
                }
            }
            TrafficEvent::Broadcast { message } => channel.post_raw(raw_text(message)),
        }
    }

    // Closing every input lets the orchestrator drain and stop.
    interceptor.uninstall();
    drop(interceptor);
    drop(channel);

    let summary = running.await.context("Orchestrator task failed")?;
    print_summary(&events, &loopback, &summary);
    Ok(())
}

fn print_summary(events: &[TrafficEvent], loopback: &Loopback, summary: &RunSummary) {
    println!();
    println!(
        "  {} {} events ({} requests, {} socket frames) → {} MCP calls",
        "Replayed".bold(),
        events.len(),
        loopback.requests(),
        loopback.frames(),
        summary.handled
    );
    println!();
    if summary.recent.len() < summary.handled {
        println!("  {}", format!("last {}:", summary.recent.len()).dimmed());
    }
    for outcome in &summary.recent {
        let line = match outcome {
            Outcome::Executed { entry, .. } => format!(
                "  {} {} {} {}",
                "✓".green(),
                outcome,
                entry.operation,
                entry.file_path.as_deref().unwrap_or(&entry.resource)
            ),
            Outcome::BlockedByPolicy | Outcome::ControlNotFound | Outcome::ClickFailed { .. } => {
                format!("  {} {}", "✗".red(), outcome)
            }
            _ => format!("  {} {}", "·".dimmed(), outcome),
        };
        println!("{}", line);
    }
    println!();
    println!(
        "  {} approved, {} not",
        summary.executed.to_string().green().bold(),
        (summary.handled - summary.executed).to_string().yellow()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_traffic() {
        let events = parse_traffic(
            r#"
# recorded session
{"kind":"request","url":"https://x.ai/api/mcp/call","body":{"tool":"github"}}
{"kind":"socket","payload":"{\"type\":\"mcp_call\"}"}
{"kind":"broadcast","message":{"type":"MCP_CALL","payload":{}}}
"#,
        )
        .unwrap();
        assert_eq!(events.len(), 3);
        match &events[0] {
            TrafficEvent::Request { method, body, .. } => {
                assert_eq!(method, "POST");
                assert_eq!(raw_text(body.as_ref().unwrap()), r#"{"tool":"github"}"#);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &events[1] {
            TrafficEvent::Socket { payload } => {
                assert_eq!(raw_text(payload), r#"{"type":"mcp_call"}"#)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_traffic_reports_line() {
        let err = parse_traffic("{\"kind\":\"request\",\"url\":\"u\"}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
