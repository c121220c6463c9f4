//! Queryable symbol table over one snapshot

use std::collections::HashSet;

use super::scanner::scan_symbols;
use super::text::SourceText;
use crate::models::lsp::Position;
use crate::models::symbol::{Symbol, SymbolKind};

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn build(source: &SourceText) -> Self {
        Self {
            symbols: scan_symbols(source),
        }
    }

    /// Every symbol in declaration order
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolve a name: first class, then first interface, then first function
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        SymbolKind::PRECEDENCE.iter().find_map(|&kind| {
            self.symbols
                .iter()
                .find(|s| s.kind == kind && s.name == name)
        })
    }

    /// Resolve the identifier under `position`
    pub fn definition_at(&self, source: &SourceText, position: Position) -> Option<&Symbol> {
        let offset = source.offset_of(position);
        let (_, word) = source.word_at(offset)?;
        self.resolve(word)
    }

    pub fn filter_by_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(move |s| s.kind == kind)
    }

    /// One symbol per distinct name, first occurrence wins
    pub fn completion_candidates(&self) -> Vec<&Symbol> {
        let mut seen = HashSet::new();
        self.symbols
            .iter()
            .filter(|s| seen.insert(s.name.as_str()))
            .collect()
    }
}
