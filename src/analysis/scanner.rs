//! Declaration scanner
//!
//! Matches class, interface and function headers over the whole text. Each
//! family is matched left-to-right without overlap; results are merged by
//! declaration offset. No nesting is tracked.

use std::sync::LazyLock;

use regex::Regex;

use super::blocks::resolve_block_end;
use super::text::SourceText;
use crate::models::symbol::{Symbol, SymbolKind, TextRange};

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:(?:abstract|final)\s+)?class\s+(?P<name>{IDENT})(?:\s+extends\s+{IDENT})?(?:\s+implements\s+{IDENT}(?:\s*,\s*{IDENT})*)?"
    ))
    .expect("class pattern is valid")
});

static INTERFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\binterface\s+(?P<name>{IDENT})"))
        .expect("interface pattern is valid")
});

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:(?:static|final|abstract)\s+)*def\s+(?P<name>{IDENT})\s*\((?:[^)\n]*\))?(?:\s*->\s*{IDENT}(?:\.{IDENT})*(?:\[[^\]\n]*\])?)?"
    ))
    .expect("function pattern is valid")
});

fn pattern(kind: SymbolKind) -> &'static Regex {
    match kind {
        SymbolKind::Class => &CLASS_RE,
        SymbolKind::Interface => &INTERFACE_RE,
        SymbolKind::Function => &FUNCTION_RE,
    }
}

/// Find every declaration in `source`, ordered by declaration offset
pub fn scan_symbols(source: &SourceText) -> Vec<Symbol> {
    let text = source.as_str();
    let mut symbols = Vec::new();

    for kind in SymbolKind::PRECEDENCE {
        for caps in pattern(kind).captures_iter(text) {
            let (Some(header), Some(name)) = (caps.get(0), caps.name("name")) else {
                continue;
            };

            let start = header.start();
            let boundary = resolve_block_end(source, start);
            let signature = header
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            let range = TextRange::new(start, boundary.end);
            let symbol = Symbol::new(name.as_str(), kind, start, range).with_signature(signature);
            symbols.push(if boundary.closed {
                symbol
            } else {
                symbol.unclosed()
            });
        }
    }

    symbols.sort_by_key(|s| s.declaration_offset);
    tracing::debug!("Scanned {} symbols", symbols.len());
    symbols
}
