//! Infrastructure layer for Lantern
//!
//! Low-level plumbing: LSP wire protocol and source file discovery.

pub mod lsp;
pub mod source_files;

pub use source_files::SourceFileFilter;
