//! Built-in shadowing detection
//!
//! Works per line on trimmed text. Only whole-line comments (`#`, `//`) are
//! skipped: a trailing comment or a string literal that happens to look like
//! a definition is still inspected. This is a known limitation.

use std::sync::LazyLock;

use regex::Regex;

use super::builtins::ReservedNames;
use super::text::SourceText;
use crate::models::shadowing::{Override, OverrideKind};

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:static|final|abstract)\s+)*def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(")
        .expect("def pattern is valid")
});

static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=").expect("assignment pattern is valid")
});

const COMMENT_PREFIXES: [&str; 2] = ["#", "//"];
const RELATIONAL_OPERATORS: [&str; 4] = ["==", "!=", "<=", ">="];

/// Detect overrides of the default reserved names
pub fn detect_overrides(source: &SourceText) -> Vec<Override> {
    detect_overrides_with(source, &ReservedNames::default())
}

pub fn detect_overrides_with(source: &SourceText, reserved: &ReservedNames) -> Vec<Override> {
    let overrides: Vec<Override> = source
        .lines()
        .filter_map(|(index, line)| {
            let (name, kind) = check_line(line.trim(), reserved)?;
            Some(Override::new(name, index as u32 + 1, kind))
        })
        .collect();

    if !overrides.is_empty() {
        tracing::debug!("Found {} built-in overrides", overrides.len());
    }
    overrides
}

fn check_line<'a>(line: &'a str, reserved: &ReservedNames) -> Option<(&'a str, OverrideKind)> {
    if line.is_empty() || COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return None;
    }

    if let Some(caps) = DEF_RE.captures(line) {
        let name = caps.get(1)?.as_str();
        return reserved
            .contains(name)
            .then_some((name, OverrideKind::FunctionDefinition));
    }

    let name = ASSIGN_RE.captures(line)?.get(1)?.as_str();
    let is_comparison = RELATIONAL_OPERATORS.iter().any(|op| line.contains(op));
    (reserved.contains(name) && !is_comparison).then_some((name, OverrideKind::Assignment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Override> {
        detect_overrides(&SourceText::new(text))
    }

    #[test]
    fn test_stacked_modifiers_before_def() {
        assert_eq!(
            detect("    static final def len(x) {"),
            vec![Override::new("len", 1, OverrideKind::FunctionDefinition)]
        );
    }

    #[test]
    fn test_function_definition_override() {
        assert_eq!(
            detect("def print(x):"),
            vec![Override::new("print", 1, OverrideKind::FunctionDefinition)]
        );
    }

    #[test]
    fn test_modified_function_definition() {
        assert_eq!(
            detect("    static final def len(xs) {"),
            vec![Override::new("len", 1, OverrideKind::FunctionDefinition)]
        );
    }

    #[test]
    fn test_assignment_override() {
        assert_eq!(
            detect("len = 5;"),
            vec![Override::new("len", 1, OverrideKind::Assignment)]
        );
    }

    #[test]
    fn test_comparisons_are_not_assignments() {
        assert!(detect("x <= 5;").is_empty());
        assert!(detect("len == 5;").is_empty());
        assert!(detect("max = a >= b;").is_empty());
        assert!(detect("min = a != b;").is_empty());
    }

    #[test]
    fn test_non_reserved_names_ignored() {
        assert!(detect("def bark() {\ncount = 1;").is_empty());
    }

    #[test]
    fn test_whole_line_comments_skipped() {
        assert!(detect("# def print(x):\n// len = 3;\n   # str = 1").is_empty());
    }

    #[test]
    fn test_trailing_comment_not_recognized() {
        // inline comments are not stripped, the assignment still counts
        assert_eq!(
            detect("str = 'x'; # keep"),
            vec![Override::new("str", 1, OverrideKind::Assignment)]
        );
    }

    #[test]
    fn test_line_numbers_and_order() {
        let text = "x = 1;\n\ndef input():\n  pass;\nlist = [];\n";
        assert_eq!(
            detect(text),
            vec![
                Override::new("input", 3, OverrideKind::FunctionDefinition),
                Override::new("list", 5, OverrideKind::Assignment),
            ]
        );
    }

    #[test]
    fn test_definition_of_non_reserved_does_not_fall_through() {
        // a def line never yields an assignment override
        assert!(detect("def helper(print = 1):").is_empty());
    }

    #[test]
    fn test_extra_reserved_names() {
        let reserved = ReservedNames::with_extra(["spawn"]);
        let found = detect_overrides_with(&SourceText::new("spawn = 2;"), &reserved);
        assert_eq!(found, vec![Override::new("spawn", 1, OverrideKind::Assignment)]);
    }
}
