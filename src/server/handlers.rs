//! Analysis results shaped as LSP payloads
//!
//! Pure functions over a [`Document`]; the server loop owns all I/O.

use super::documents::Document;
use crate::analysis::builtins::{KEYWORDS, builtin_summary};
use crate::analysis::{ReservedNames, SourceText};
use crate::infra::lsp::protocol::{
    CompletionItem, CompletionItemKind, DocumentSymbol, Hover, LspDiagnostic,
    LspDiagnosticSeverity, LspLocation, LspSymbolKind, MarkupContent, Position, Range,
};
use crate::models::symbol::Symbol;

const DIAGNOSTIC_SOURCE: &str = "lantern";

fn offsets_to_range(source: &SourceText, start: usize, end: usize) -> Range {
    Range::new(source.position_of(start), source.position_of(end))
}

/// Range of the symbol's name inside its declaration header
pub fn name_range(source: &SourceText, symbol: &Symbol) -> Range {
    let text = source.as_str();
    let header_end = symbol.range.end.min(text.len());
    let header = &text[symbol.declaration_offset..header_end];

    let after_keyword = header
        .find(symbol.kind.keyword())
        .map_or(0, |i| i + symbol.kind.keyword().len());
    let start = header[after_keyword..]
        .find(symbol.name.as_str())
        .map_or(symbol.declaration_offset, |i| {
            symbol.declaration_offset + after_keyword + i
        });

    offsets_to_range(source, start, start + symbol.name.len())
}

pub fn document_symbols(doc: &Document) -> Vec<DocumentSymbol> {
    doc.analysis
        .symbols
        .symbols()
        .iter()
        .map(|symbol| DocumentSymbol {
            name: symbol.name.clone(),
            detail: (!symbol.signature.is_empty()).then(|| symbol.signature.clone()),
            kind: LspSymbolKind::from(symbol.kind),
            range: offsets_to_range(&doc.source, symbol.range.start, symbol.range.end),
            selection_range: name_range(&doc.source, symbol),
        })
        .collect()
}

pub fn definition(uri: &str, doc: &Document, position: Position) -> Option<LspLocation> {
    let symbol = doc.analysis.symbols.definition_at(&doc.source, position)?;
    Some(LspLocation {
        uri: uri.to_string(),
        range: name_range(&doc.source, symbol),
    })
}

pub fn hover(doc: &Document, position: Position, reserved: &ReservedNames) -> Option<Hover> {
    let offset = doc.source.offset_of(position);
    let (start, word) = doc.source.word_at(offset)?;
    let range = offsets_to_range(&doc.source, start, start + word.len());

    let value = if let Some(symbol) = doc.analysis.symbols.resolve(word) {
        let line = doc.source.line_of(symbol.declaration_offset) + 1;
        let mut text = format!(
            "```lantern\n{}\n```\n\n{} declared on line {}",
            symbol.signature, symbol.kind, line
        );
        if !symbol.block_closed {
            text.push_str(" (block not closed)");
        }
        text
    } else if reserved.contains(word) {
        let summary = builtin_summary(word).unwrap_or("Reserved name");
        format!("```lantern\n{}\n```\n\nBuilt-in: {}", word, summary)
    } else {
        return None;
    };

    Some(Hover {
        contents: MarkupContent::markdown(value),
        range: Some(range),
    })
}

/// Document symbols first, then built-ins, then keywords
pub fn completion(doc: &Document, reserved: &ReservedNames) -> Vec<CompletionItem> {
    let symbols = doc
        .analysis
        .symbols
        .completion_candidates()
        .into_iter()
        .map(|symbol| CompletionItem {
            label: symbol.name.clone(),
            kind: CompletionItemKind::from(symbol.kind),
            detail: Some(symbol.signature.clone()),
        });

    let builtins = reserved.iter().map(|name| CompletionItem {
        label: name.to_string(),
        kind: CompletionItemKind::Function,
        detail: Some(builtin_summary(name).unwrap_or("built-in").to_string()),
    });

    let keywords = KEYWORDS.iter().map(|kw| CompletionItem {
        label: kw.to_string(),
        kind: CompletionItemKind::Keyword,
        detail: None,
    });

    symbols.chain(builtins).chain(keywords).collect()
}

pub fn diagnostics(doc: &Document) -> Vec<LspDiagnostic> {
    doc.analysis
        .diagnostics
        .iter()
        .map(|diag| LspDiagnostic {
            range: diag.range.to_range(),
            severity: Some(LspDiagnosticSeverity::from(diag.severity)),
            code: Some(serde_json::Value::String(diag.code.clone())),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: diag.message.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::server::documents::DocumentStore;

    const SOURCE: &str = "final class Dog extends Animal {\n    def bark() -> None {\n        print(\"woof\");\n    }\n}\nDog;\n";

    fn with_doc<T>(text: &str, f: impl FnOnce(&Document) -> T) -> T {
        let mut store = DocumentStore::new(Analyzer::default());
        f(store.upsert("file:///dog.ln", 1, text.to_string()))
    }

    #[test]
    fn test_document_symbols_flat() {
        let symbols = with_doc(SOURCE, document_symbols);
        assert_eq!(symbols.len(), 2);

        assert_eq!(symbols[0].name, "Dog");
        assert_eq!(symbols[0].kind, LspSymbolKind::Class);
        assert_eq!(symbols[0].range.start, Position::new(0, 0));
        assert_eq!(symbols[0].range.end, Position::new(4, 1));
        assert_eq!(symbols[0].selection_range.start, Position::new(0, 12));
        assert_eq!(symbols[0].selection_range.end, Position::new(0, 15));

        assert_eq!(symbols[1].name, "bark");
        assert_eq!(symbols[1].kind, LspSymbolKind::Function);
        assert_eq!(symbols[1].range.end, Position::new(3, 5));
    }

    #[test]
    fn test_definition_on_usage() {
        let loc = with_doc(SOURCE, |doc| {
            definition("file:///dog.ln", doc, Position::new(5, 1))
        })
        .unwrap();
        assert_eq!(loc.uri, "file:///dog.ln");
        assert_eq!(loc.range.start, Position::new(0, 12));

        assert!(with_doc(SOURCE, |doc| definition("file:///dog.ln", doc, Position::new(2, 20))).is_none());
    }

    #[test]
    fn test_hover_symbol_and_builtin() {
        let reserved = ReservedNames::default();

        let hover_dog = with_doc(SOURCE, |doc| hover(doc, Position::new(5, 0), &reserved)).unwrap();
        assert!(hover_dog.contents.value.contains("class Dog extends Animal"));
        assert!(hover_dog.contents.value.contains("line 1"));

        let hover_print =
            with_doc(SOURCE, |doc| hover(doc, Position::new(2, 9), &reserved)).unwrap();
        assert!(hover_print.contents.value.contains("Built-in"));

        assert!(with_doc(SOURCE, |doc| hover(doc, Position::new(2, 16), &reserved)).is_none());
    }

    #[test]
    fn test_completion_order() {
        let reserved = ReservedNames::default();
        let items = with_doc(SOURCE, |doc| completion(doc, &reserved));

        assert_eq!(items[0].label, "Dog");
        assert_eq!(items[0].kind, CompletionItemKind::Class);
        assert_eq!(items[1].label, "bark");
        assert!(items.iter().any(|i| i.label == "len" && i.kind == CompletionItemKind::Function));
        assert!(items.iter().any(|i| i.label == "class" && i.kind == CompletionItemKind::Keyword));
        assert_eq!(items.len(), 2 + reserved.len() + KEYWORDS.len());
    }

    #[test]
    fn test_diagnostics_conversion() {
        let diags = with_doc("x = 1\n", diagnostics);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(LspDiagnosticSeverity::Warning));
        assert_eq!(diags[0].range.start, Position::new(0, 4));
        assert_eq!(diags[0].source.as_deref(), Some("lantern"));
    }
}
