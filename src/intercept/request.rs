//! Request transport decorator.

use crate::intercept::descriptor::descriptor_from_request;
use crate::intercept::sink::CallSink;
use crate::intercept::transport::{IncomingResponse, OutgoingRequest, RequestTransport};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Wraps a request transport: inspects every request, then forwards it to
/// the original unchanged. The original call always runs, and its result
/// (success or error) is returned as-is.
pub struct InterceptedRequests {
    inner: Arc<dyn RequestTransport>,
    sink: CallSink,
}

impl InterceptedRequests {
    pub fn new(inner: Arc<dyn RequestTransport>, sink: CallSink) -> Self {
        Self { inner, sink }
    }
}

#[async_trait]
impl RequestTransport for InterceptedRequests {
    async fn fetch(&self, request: OutgoingRequest) -> Result<IncomingResponse> {
        if let Some(call) = descriptor_from_request(&request) {
            self.sink.dispatch(call);
        }
        self.inner.fetch(request).await
    }
}
