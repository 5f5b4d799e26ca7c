pub mod channel;
pub mod descriptor;
pub mod handle;
pub mod request;
pub mod sink;
pub mod socket;
pub mod transport;

pub use channel::{CallChannel, ChannelMessage};
pub use descriptor::extract_repository;
pub use handle::{HostNetwork, Interceptor};
pub use sink::CallSink;
pub use transport::{Frame, IncomingResponse, OutgoingRequest, RequestTransport, SocketTransport};
