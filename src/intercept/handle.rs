//! Interceptor handle — installs and removes the transport decorators.
//!
//! `HostNetwork` holds the transports the host page sends through. Installing
//! swaps each one for a decorator and keeps the originals; uninstalling puts
//! the originals back. Installing twice is a no-op, so transports are never
//! wrapped twice by the same handle.

use crate::intercept::request::InterceptedRequests;
use crate::intercept::sink::CallSink;
use crate::intercept::socket::InterceptedSocket;
use crate::intercept::transport::{RequestTransport, SocketTransport};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// The host's current request and socket transports.
pub struct HostNetwork {
    request: RwLock<Arc<dyn RequestTransport>>,
    socket: RwLock<Arc<dyn SocketTransport>>,
}

impl HostNetwork {
    pub fn new(request: Arc<dyn RequestTransport>, socket: Arc<dyn SocketTransport>) -> Self {
        Self {
            request: RwLock::new(request),
            socket: RwLock::new(socket),
        }
    }

    /// The transport the host should use for its next request.
    pub fn request_transport(&self) -> Arc<dyn RequestTransport> {
        self.request.read().clone()
    }

    pub fn socket_transport(&self) -> Arc<dyn SocketTransport> {
        self.socket.read().clone()
    }
}

struct Originals {
    request: Arc<dyn RequestTransport>,
    socket: Arc<dyn SocketTransport>,
}

pub struct Interceptor {
    host: Arc<HostNetwork>,
    sink: CallSink,
    originals: Mutex<Option<Originals>>,
}

impl Interceptor {
    pub fn new(host: Arc<HostNetwork>, sink: CallSink) -> Self {
        Self {
            host,
            sink,
            originals: Mutex::new(None),
        }
    }

    /// Wrap the host's transports. Returns false if already installed.
    pub fn install(&self) -> bool {
        let mut originals = self.originals.lock();
        if originals.is_some() {
            return false;
        }

        let mut request = self.host.request.write();
        let mut socket = self.host.socket.write();

        let saved = Originals {
            request: request.clone(),
            socket: socket.clone(),
        };
        let wrapped_request: Arc<dyn RequestTransport> = Arc::new(InterceptedRequests::new(
            saved.request.clone(),
            self.sink.clone(),
        ));
        let wrapped_socket: Arc<dyn SocketTransport> = Arc::new(InterceptedSocket::new(
            saved.socket.clone(),
            self.sink.clone(),
        ));
        *request = wrapped_request;
        *socket = wrapped_socket;
        *originals = Some(saved);

        tracing::info!("Interceptor installed");
        true
    }

    /// Restore the original transports. Returns false if not installed.
    pub fn uninstall(&self) -> bool {
        let Some(saved) = self.originals.lock().take() else {
            return false;
        };

        *self.host.request.write() = saved.request;
        *self.host.socket.write() = saved.socket;

        tracing::info!("Interceptor uninstalled");
        true
    }

    pub fn is_installed(&self) -> bool {
        self.originals.lock().is_some()
    }
}

impl Drop for Interceptor {
    fn drop(&mut self) {
        self.uninstall();
    }
}
