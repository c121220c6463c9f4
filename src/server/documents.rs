//! Open documents and their latest analysis
//!
//! Every open or change re-runs the full analysis and replaces whatever the
//! store held for that URI. Nothing is patched incrementally.

use std::collections::HashMap;

use crate::analysis::{Analysis, Analyzer, SourceText};

#[derive(Debug)]
pub struct Document {
    pub version: i32,
    pub source: SourceText,
    pub analysis: Analysis,
}

pub struct DocumentStore {
    analyzer: Analyzer,
    documents: HashMap<String, Document>,
}

impl DocumentStore {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            documents: HashMap::new(),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Store `text` as the current snapshot of `uri` (open and change alike)
    pub fn upsert(&mut self, uri: &str, version: i32, text: String) -> &Document {
        let source = SourceText::new(text);
        let analysis = self.analyzer.analyze(&source);
        tracing::debug!(
            "Analyzed {} v{}: {} symbols, {} overrides, {} diagnostics",
            uri,
            version,
            analysis.symbols.len(),
            analysis.overrides.len(),
            analysis.diagnostics.len()
        );

        let document = Document {
            version,
            source,
            analysis,
        };
        self.documents.insert(uri.to_string(), document);
        &self.documents[uri]
    }

    pub fn get(&self, uri: &str) -> Option<&Document> {
        self.documents.get(uri)
    }

    pub fn close(&mut self, uri: &str) -> bool {
        self.documents.remove(uri).is_some()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_previous_analysis() {
        let mut store = DocumentStore::new(Analyzer::default());

        let doc = store.upsert("file:///a.ln", 1, "return 1\nx = 2".to_string());
        assert_eq!(doc.analysis.diagnostics.len(), 2);

        let doc = store.upsert("file:///a.ln", 2, "return 1;".to_string());
        assert_eq!(doc.version, 2);
        assert!(doc.analysis.diagnostics.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_close() {
        let mut store = DocumentStore::new(Analyzer::default());
        store.upsert("file:///a.ln", 1, "class A {}".to_string());

        assert!(store.close("file:///a.ln"));
        assert!(!store.close("file:///a.ln"));
        assert!(store.get("file:///a.ln").is_none());
        assert!(store.is_empty());
    }
}
