//! Transport abstractions the interceptor decorates.
//!
//! The host's networking is modeled as two narrow interfaces: a request
//! transport (fetch-equivalent) and a socket transport (send plus inbound
//! message subscription). Interception wraps these interfaces instead of
//! patching anything global.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// An outgoing request as the host page issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl OutgoingRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingResponse {
    pub status: u16,
    pub body: String,
}

/// Fetch-equivalent request function.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    async fn fetch(&self, request: OutgoingRequest) -> Result<IncomingResponse>;
}

/// One socket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

pub type MessageHandler = Arc<dyn Fn(&Frame) + Send + Sync>;

/// WebSocket-equivalent connection.
pub trait SocketTransport: Send + Sync {
    fn send(&self, frame: Frame) -> Result<()>;

    /// Register a handler for inbound frames.
    fn on_message(&self, handler: MessageHandler);
}
