//! Diagnostic model produced by the line linter

use serde::{Deserialize, Serialize};

use super::lsp::{Position, Range};

/// Span of a diagnostic on a single line (0-indexed line, UTF-16 columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl LineRange {
    pub fn new(line: u32, start_column: u32, end_column: u32) -> Self {
        Self {
            line,
            start_column,
            end_column,
        }
    }

    pub fn to_range(self) -> Range {
        Range::new(
            Position::new(self.line, self.start_column),
            Position::new(self.line, self.end_column),
        )
    }
}

/// Lint diagnostic for one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub range: LineRange,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub code: String,
}

impl Diagnostic {
    pub fn warning(range: LineRange, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            range,
            severity: DiagnosticSeverity::Warning,
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn display_line(&self) -> u32 {
        self.range.line + 1
    }

    pub fn display_column(&self) -> u32 {
        self.range.start_column + 1
    }

    pub fn display_end_column(&self) -> u32 {
        self.range.end_column + 1
    }
}

/// Severity levels, numbered as on the LSP wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Information => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

impl std::str::FromStr for DiagnosticSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" | "e" => Ok(Self::Error),
            "warning" | "warn" | "w" => Ok(Self::Warning),
            "info" | "information" | "i" => Ok(Self::Information),
            "hint" | "h" => Ok(Self::Hint),
            _ => Err(format!(
                "Unknown severity: '{}'. Valid: error, warning, info, hint",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_coordinates_are_one_based() {
        let diag = Diagnostic::warning(LineRange::new(2, 7, 8), "code", "message");
        assert_eq!(diag.display_line(), 3);
        assert_eq!(diag.display_column(), 8);
        assert_eq!(diag.display_end_column(), 9);
        assert_eq!(diag.severity, DiagnosticSeverity::Warning);
    }

    #[test]
    fn test_line_range_to_lsp_range() {
        let range = LineRange::new(4, 1, 2).to_range();
        assert_eq!(range.start, Position::new(4, 1));
        assert_eq!(range.end, Position::new(4, 2));
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!(
            "warn".parse::<DiagnosticSeverity>(),
            Ok(DiagnosticSeverity::Warning)
        );
        assert!("fatal".parse::<DiagnosticSeverity>().is_err());
    }
}
