//! Output formatting for CLI commands

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    /// One finding per line, `file:line:column: message`
    Text,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown output format '{other}' (expected json or text)")),
        }
    }
}

/// Output context for consistent formatting across commands
///
/// Every command prints through this context so that JSON consumers see
/// the same envelope regardless of which command ran.
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Project root for relative path calculation
    root: PathBuf,
    format: OutputFormat,
}

impl OutputContext {
    pub fn new(root: PathBuf, format: OutputFormat) -> Self {
        Self { root, format }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Convert an absolute path to relative (if within project root)
    pub fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    /// Print a successful response with data fields at top level
    pub fn print_success_flat<T: Serialize>(&self, data: T) {
        let mut response = serde_json::to_value(data).unwrap_or(serde_json::json!({}));
        if let Some(obj) = response.as_object_mut() {
            obj.insert("success".to_string(), serde_json::json!(true));
        }
        print_json(&response);
    }

    /// Print the lines rendered from `data` in text mode, otherwise the
    /// flat JSON response
    pub fn print_report<T: Serialize>(&self, data: T, lines: impl FnOnce(&T) -> Vec<String>) {
        match self.format {
            OutputFormat::Json => self.print_success_flat(data),
            OutputFormat::Text => {
                for line in lines(&data) {
                    println!("{line}");
                }
            }
        }
    }

    pub fn print_error(&self, message: &str) {
        match self.format {
            OutputFormat::Json => print_json(&error_json(message)),
            OutputFormat::Text => eprintln!("error: {message}"),
        }
    }
}

pub fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": message
    })
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}
