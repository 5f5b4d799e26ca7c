//! Socket transport decorator.

use crate::intercept::descriptor::descriptor_from_socket_message;
use crate::intercept::sink::CallSink;
use crate::intercept::transport::{Frame, MessageHandler, SocketTransport};
use anyhow::Result;
use std::sync::Arc;

/// Wraps a socket: text frames are inspected on the way out, then every
/// frame goes to the original `send` unchanged. Frames that aren't JSON are
/// normal traffic and are ignored.
pub struct InterceptedSocket {
    inner: Arc<dyn SocketTransport>,
    sink: CallSink,
}

impl InterceptedSocket {
    pub fn new(inner: Arc<dyn SocketTransport>, sink: CallSink) -> Self {
        Self { inner, sink }
    }
}

impl SocketTransport for InterceptedSocket {
    fn send(&self, frame: Frame) -> Result<()> {
        if let Frame::Text(ref text) = frame {
            if let Some(call) = descriptor_from_socket_message(text) {
                self.sink.dispatch(call);
            }
        }
        self.inner.send(frame)
    }

    fn on_message(&self, handler: MessageHandler) {
        self.inner.on_message(handler)
    }
}
