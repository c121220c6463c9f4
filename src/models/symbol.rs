//! Symbol model definitions
//!
//! Declaration sites found by the symbol scanner. Symbols are flat: a method
//! declared inside a class is its own `Function` symbol, never a child.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)` into a source snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A named, positioned declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub declaration_offset: usize,
    pub range: TextRange,
    /// Whether a matching closing brace was found; when false the range
    /// runs to end-of-document.
    pub block_closed: bool,
    /// Declaration header as written, whitespace-normalized
    pub signature: String,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        declaration_offset: usize,
        range: TextRange,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            declaration_offset,
            range,
            block_closed: true,
            signature: String::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn unclosed(mut self) -> Self {
        self.block_closed = false;
        self
    }
}

/// Declaration kinds recognized by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Interface,
    Function,
}

impl SymbolKind {
    /// Lookup precedence used by name resolution
    pub const PRECEDENCE: [SymbolKind; 3] = [Self::Class, Self::Interface, Self::Function];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "def",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "class" | "c" => Ok(Self::Class),
            "interface" | "i" => Ok(Self::Interface),
            "function" | "def" | "fn" | "f" => Ok(Self::Function),
            _ => Err(format!(
                "Unknown symbol kind: '{}'. Valid: class, interface, function",
                s
            )),
        }
    }
}
