//! Named cross-context broadcast channel for observed calls.
//!
//! Any context on the same channel can post a call it observed; every
//! subscriber treats it exactly like a directly intercepted call. Messages
//! travel as JSON text so that foreign senders are handled uniformly:
//! anything that doesn't decode as `{"type":"MCP_CALL","payload":...}` is
//! ignored. Payloads decode leniently (see `CallDescriptor`), and every
//! received call gets a fresh local id.

use crate::policy::types::CallDescriptor;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    #[serde(rename = "MCP_CALL")]
    McpCall { payload: CallDescriptor },
}

impl ChannelMessage {
    /// Decode a raw message. Malformed messages are not an error.
    pub fn parse(raw: &str) -> Option<ChannelMessage> {
        serde_json::from_str(raw).ok()
    }
}

/// A named broadcast channel. Clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct CallChannel {
    name: String,
    tx: broadcast::Sender<String>,
}

impl CallChannel {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            name: name.into(),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post a call to every subscriber.
    pub fn post_call(&self, call: &CallDescriptor) {
        let message = ChannelMessage::McpCall {
            payload: call.clone(),
        };
        match serde_json::to_string(&message) {
            Ok(raw) => self.post_raw(raw),
            Err(e) => tracing::error!("Failed to encode channel message: {}", e),
        }
    }

    /// Post raw text, as a foreign context would.
    pub fn post_raw(&self, raw: impl Into<String>) {
        // No subscribers is fine.
        let _ = self.tx.send(raw.into());
    }

    pub fn subscribe(&self) -> CallSubscription {
        CallSubscription {
            name: self.name.clone(),
            rx: self.tx.subscribe(),
        }
    }
}

pub struct CallSubscription {
    name: String,
    rx: broadcast::Receiver<String>,
}

impl CallSubscription {
    /// Next call posted on the channel, skipping anything malformed.
    /// Returns None once every sender is gone.
    pub async fn recv(&mut self) -> Option<CallDescriptor> {
        loop {
            match self.rx.recv().await {
                Ok(raw) => match ChannelMessage::parse(&raw) {
                    Some(ChannelMessage::McpCall { payload }) => return Some(payload),
                    None => tracing::debug!("Ignoring malformed message on '{}'", self.name),
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Channel '{}' dropped {} messages", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::types::Operation;

    #[tokio::test]
    async fn test_post_and_receive() {
        let channel = CallChannel::new("test");
        let mut sub = channel.subscribe();

        let call = CallDescriptor::new("github", Operation::Create).with_repository("owner/repo");
        channel.post_call(&call);

        let received = sub.recv().await.unwrap();
        assert_ne!(received.id, call.id);
        assert_eq!(received.timestamp, call.timestamp);
        assert_eq!(received.repository.as_deref(), Some("owner/repo"));
    }

    #[tokio::test]
    async fn test_foreign_payload_with_epoch_timestamp() {
        let channel = CallChannel::new("test");
        let mut sub = channel.subscribe();

        channel.post_raw(
            r#"{"type":"MCP_CALL","payload":{"provider":"github","operation":"PUT","repository":"owner/repo","timestamp":1700000000000}}"#,
        );

        let received = sub.recv().await.unwrap();
        assert_eq!(received.operation, Operation::Update);
        assert_eq!(received.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(received.repository.as_deref(), Some("owner/repo"));
    }

    #[tokio::test]
    async fn test_repeated_message_gets_distinct_ids() {
        let channel = CallChannel::new("test");
        let mut sub = channel.subscribe();

        let raw = r#"{"type":"MCP_CALL","payload":{"id":"9b2f6c1e-0c4e-4a53-8a8e-2f4f3b7d9a10","provider":"github","operation":"create"}}"#;
        channel.post_raw(raw);
        channel.post_raw(raw);

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_malformed_messages_are_skipped() {
        let channel = CallChannel::new("test");
        let mut sub = channel.subscribe();

        channel.post_raw("not json");
        channel.post_raw(r#"{"type":"SOMETHING_ELSE"}"#);
        channel.post_raw(r#"{"type":"MCP_CALL","payload":{"provider":"github","operation":"delete"}}"#);

        let received = sub.recv().await.unwrap();
        assert_eq!(received.operation, Operation::Delete);
        assert_eq!(received.resource, "file");
    }

    #[tokio::test]
    async fn test_closed_channel_ends_subscription() {
        let channel = CallChannel::new("test");
        let mut sub = channel.subscribe();
        drop(channel);
        assert!(sub.recv().await.is_none());
    }
}
