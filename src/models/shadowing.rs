//! Built-in shadowing model

use std::fmt;

use serde::{Deserialize, Serialize};

/// A line that redefines a reserved built-in name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub name: String,
    /// 1-based line number
    pub line_number: u32,
    pub kind: OverrideKind,
}

impl Override {
    pub fn new(name: impl Into<String>, line_number: u32, kind: OverrideKind) -> Self {
        Self {
            name: name.into(),
            line_number,
            kind,
        }
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: '{}' redefined by {}",
            self.line_number, self.name, self.kind
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    FunctionDefinition,
    Assignment,
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FunctionDefinition => write!(f, "function definition"),
            Self::Assignment => write!(f, "assignment"),
        }
    }
}
