//! Language server over stdio
//!
//! Speaks LSP (JSON-RPC 2.0 with Content-Length framing) and answers every
//! request from the analyzer's latest snapshot of the document.

pub mod documents;
pub mod handlers;
mod service;

pub use documents::{Document, DocumentStore};
pub use service::{COMMAND_CHECK, COMMAND_COMPILE, ExitReason, LanguageServer};
