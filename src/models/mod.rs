//! Data models for Lantern
//!
//! Plain serde types shared by the analyzer, services, server and CLI.

pub mod config;
pub mod diagnostic;
pub mod lsp;
pub mod shadowing;
pub mod symbol;

pub use config::LanternConfig;
pub use diagnostic::{Diagnostic, DiagnosticSeverity, LineRange};
pub use lsp::{Position, Range};
pub use shadowing::{Override, OverrideKind};
pub use symbol::{Symbol, SymbolKind, TextRange};
