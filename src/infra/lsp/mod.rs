//! LSP Infrastructure for Lantern
//!
//! Shared by both ends of the protocol:
//! - JSON-RPC 2.0 protocol types
//! - Async message transport with Content-Length framing
//! - Client session for driving a language server process

pub mod protocol;
pub mod session;
pub mod transport;

pub use session::LanguageServerSession;
pub use transport::{Transport, write_message};
