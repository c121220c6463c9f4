//! `file:line[:column]` arguments

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::analysis::SourceText;
use crate::models::lsp::Position;

const FORMAT_HINT: &str = "Expected: file:line[:column]\nExample: src/main.ln:10:5";

#[derive(Debug, Clone)]
pub struct ParsedLocation {
    pub file: PathBuf,
    /// 1-indexed
    pub line: u32,
    /// 1-indexed
    pub column: u32,
}

impl ParsedLocation {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Location cannot be empty");
        }

        let split = Self::find_position_separator(input)?;
        let file = PathBuf::from(&input[..split]);
        let (line, column) = Self::parse_position(&input[split + 1..])?;

        Ok(Self { file, line, column })
    }

    /// First `:` followed by a digit, skipping a Windows drive prefix
    fn find_position_separator(input: &str) -> Result<usize> {
        let bytes = input.as_bytes();
        let has_drive = bytes.len() > 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic();
        let from = if has_drive { 2 } else { 0 };

        for (idx, ch) in input[from..].char_indices() {
            if ch != ':' {
                continue;
            }
            let at = from + idx;
            match input[at + 1..].chars().next() {
                Some(c) if c.is_ascii_digit() => return Ok(at),
                Some('-') => bail!("Invalid line number: negative values not allowed.\n{FORMAT_HINT}"),
                _ => {}
            }
        }

        bail!("Invalid location format. {FORMAT_HINT}")
    }

    fn parse_position(rest: &str) -> Result<(u32, u32)> {
        let (line_str, col_str) = match rest.split_once(':') {
            Some((l, c)) => (l, Some(c)),
            None => (rest, None),
        };

        let line: u32 = line_str.parse().map_err(|_| {
            anyhow::anyhow!("Invalid line number '{}': must be a positive integer", line_str)
        })?;
        let column: u32 = match col_str {
            Some(c) => c.parse().map_err(|_| {
                anyhow::anyhow!("Invalid column number '{}': must be a positive integer", c)
            })?,
            None => 1,
        };

        if line == 0 {
            bail!("Line number must be >= 1 (got 0). Line numbers are 1-indexed.");
        }
        if column == 0 {
            bail!("Column number must be >= 1 (got 0). Column numbers are 1-indexed.");
        }

        Ok((line, column))
    }

    /// Resolve `file` against the working directory
    pub fn to_absolute(&self) -> Result<Self> {
        let file = if self.file.is_absolute() {
            self.file.clone()
        } else {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(&self.file)
        };

        if !file.is_file() {
            bail!("File not found: {}", file.display());
        }

        Ok(Self {
            file,
            line: self.line,
            column: self.column,
        })
    }

    pub fn position(&self) -> Position {
        Position::from_cli(self.line, self.column)
    }

    /// Reject positions past the end of the file or line
    pub fn validate_against(&self, source: &SourceText) -> Result<()> {
        let line_count = source.line_count().max(1);
        let Some(line) = source.line(self.line as usize - 1) else {
            bail!(
                "Line {} exceeds file length ({} lines)",
                self.line,
                line_count
            );
        };

        let col_max = line.encode_utf16().count() + 1;
        if self.column as usize > col_max {
            bail!(
                "Column {} exceeds line length ({} chars) at line {}",
                self.column,
                col_max - 1,
                self.line
            );
        }
        Ok(())
    }
}

impl std::fmt::Display for ParsedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}
