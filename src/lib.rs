//! MCP auto-approve library.
//!
//! Watches outgoing traffic for MCP tool calls, evaluates them against
//! per-provider approval rules, and, after a cancellable countdown, presses
//! the host's approval button and records the approval. The binary
//! entrypoint is in `main.rs`.

pub mod approval;
pub mod audit;
pub mod cli;
pub mod error;
pub mod intercept;
pub mod orchestrator;
pub mod policy;
pub mod storage;
pub mod utils;
