//! Source analyzer
//!
//! Pattern-based, single-pass analysis of one immutable text snapshot:
//!
//! - declaration scanning and block ranges ([`scanner`], [`blocks`])
//! - built-in shadowing ([`shadow`])
//! - line terminator lint ([`lint`])
//!
//! Nothing here parses the language properly or fails on malformed input.
//! Results are recomputed from scratch for every snapshot.

pub mod blocks;
pub mod builtins;
pub mod lint;
pub mod scanner;
pub mod shadow;
pub mod table;
pub mod text;

pub use blocks::{BlockBoundary, resolve_block_end};
pub use builtins::ReservedNames;
pub use lint::lint;
pub use scanner::scan_symbols;
pub use shadow::{detect_overrides, detect_overrides_with};
pub use table::SymbolTable;
pub use text::SourceText;

use crate::models::config::AnalysisConfig;
use crate::models::diagnostic::Diagnostic;
use crate::models::shadowing::Override;

/// Output of all three analyses over one snapshot
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub overrides: Vec<Override>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Configured entry point for running every analysis
#[derive(Debug, Clone)]
pub struct Analyzer {
    reserved: ReservedNames,
    lint_enabled: bool,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            reserved: ReservedNames::default(),
            lint_enabled: true,
        }
    }
}

impl Analyzer {
    pub fn new(reserved: ReservedNames, lint_enabled: bool) -> Self {
        Self {
            reserved,
            lint_enabled,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            ReservedNames::with_extra(config.extra_reserved_names.iter().cloned()),
            config.lint,
        )
    }

    pub fn reserved(&self) -> &ReservedNames {
        &self.reserved
    }

    pub fn analyze(&self, source: &SourceText) -> Analysis {
        Analysis {
            symbols: SymbolTable::build(source),
            overrides: self.overrides(source),
            diagnostics: self.diagnostics(source),
        }
    }

    pub fn overrides(&self, source: &SourceText) -> Vec<Override> {
        detect_overrides_with(source, &self.reserved)
    }

    pub fn diagnostics(&self, source: &SourceText) -> Vec<Diagnostic> {
        if self.lint_enabled {
            lint(source)
        } else {
            Vec::new()
        }
    }
}
