pub mod log;
pub mod types;

pub use log::AuditLog;
pub use types::*;
