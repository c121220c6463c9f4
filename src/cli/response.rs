//! Response types for CLI output
//!
//! Defines shared response types for commands.
//! All types implement Serialize for consistent JSON output.
//! Lines and columns are 1-indexed here, unlike the LSP wire format.

use serde::Serialize;

use crate::analysis::SourceText;
use crate::models::diagnostic::Diagnostic;
use crate::models::shadowing::Override;
use crate::models::symbol::Symbol;

/// Location in a file (relative path by default)
#[derive(Debug, Clone, Serialize)]
pub struct LocationOutput {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl LocationOutput {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn at_offset(file: &str, source: &SourceText, offset: usize) -> Self {
        let (line, column) = source.position_of(offset).to_display();
        Self::new(file, line, column)
    }
}

/// Symbol output for outline and definition
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutput {
    pub name: String,
    pub kind: String,
    pub signature: String,
    pub location: LocationOutput,
    pub end_location: LocationOutput,
    /// false when the block never closes and the range runs to end of file
    pub closed: bool,
}

impl SymbolOutput {
    pub fn from_symbol(symbol: &Symbol, file: &str, source: &SourceText) -> Self {
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind.to_string(),
            signature: symbol.signature.clone(),
            location: LocationOutput::at_offset(file, source, symbol.declaration_offset),
            end_location: LocationOutput::at_offset(file, source, symbol.range.end),
            closed: symbol.block_closed,
        }
    }
}

/// Response for outline command
#[derive(Debug, Serialize)]
pub struct SymbolsResponse {
    pub file: String,
    pub count: usize,
    pub symbols: Vec<SymbolOutput>,
}

/// Response for definition command
#[derive(Debug, Serialize)]
pub struct DefinitionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<SymbolOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for hover command
#[derive(Debug, Serialize)]
pub struct HoverResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<LocationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Diagnostic output
#[derive(Debug, Serialize)]
pub struct DiagnosticOutput {
    pub severity: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_column: u32,
    pub code: String,
}

impl From<&Diagnostic> for DiagnosticOutput {
    fn from(d: &Diagnostic) -> Self {
        Self {
            severity: d.severity.to_string(),
            message: d.message.clone(),
            line: d.display_line(),
            column: d.display_column(),
            end_column: d.display_end_column(),
            code: d.code.clone(),
        }
    }
}

/// Diagnostics for a single file
#[derive(Debug, Serialize)]
pub struct FileDiagnostics {
    pub file: String,
    pub count: usize,
    pub diagnostics: Vec<DiagnosticOutput>,
}

/// Response for lint command
#[derive(Debug, Serialize)]
pub struct LintResponse {
    pub files_checked: usize,
    pub total: usize,
    pub files: Vec<FileDiagnostics>,
}

/// Response for shadows command
#[derive(Debug, Serialize)]
pub struct OverridesResponse {
    pub file: String,
    pub count: usize,
    pub overrides: Vec<Override>,
}
