//! Editor-facing position types and URI helpers
//!
//! Positions are 0-indexed with UTF-16 columns, matching the LSP wire format.
//! The CLI converts to and from 1-indexed display coordinates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Position within a document (0-indexed, LSP standard)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Convert 1-indexed CLI input to 0-indexed position
    pub fn from_cli(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            character: column.saturating_sub(1),
        }
    }

    /// Convert to 1-indexed display position
    pub fn to_display(&self) -> (u32, u32) {
        (self.line + 1, self.character + 1)
    }
}

/// Range within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

/// Convert a file path to a `file://` URI, percent-encoding reserved bytes
pub fn path_to_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut uri = String::from("file://");
    for byte in absolute.to_string_lossy().bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'/' | b'.' | b'-' | b'_' | b'~') {
            uri.push(byte as char);
        } else {
            uri.push_str(&format!("%{byte:02X}"));
        }
    }
    uri
}

/// Convert a `file://` URI back into a path
///
/// Non-file URIs are returned verbatim as a path so callers can still report them.
pub fn uri_to_path(uri: &str) -> PathBuf {
    let Some(rest) = uri.strip_prefix("file://") else {
        tracing::warn!("Not a file URI: {}", uri);
        return PathBuf::from(uri);
    };

    #[cfg(windows)]
    let rest = rest.strip_prefix('/').unwrap_or(rest);

    PathBuf::from(percent_decode(rest))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && let (Some(high), Some(low)) = (
                bytes.get(i + 1).copied().and_then(hex_digit),
                bytes.get(i + 2).copied().and_then(hex_digit),
            )
        {
            decoded.push((high << 4) | low);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_from_cli() {
        let pos = Position::from_cli(10, 5);
        assert_eq!(pos, Position::new(9, 4));
        assert_eq!(Position::from_cli(0, 0), Position::new(0, 0));
    }

    #[test]
    fn test_position_to_display() {
        assert_eq!(Position::new(9, 4).to_display(), (10, 5));
    }

    #[test]
    fn test_uri_roundtrip_with_spaces() {
        let path = PathBuf::from("/work/my project/main.ln");
        let uri = path_to_uri(&path);
        assert_eq!(uri, "file:///work/my%20project/main.ln");
        assert_eq!(uri_to_path(&uri), path);
    }

    #[test]
    fn test_uri_roundtrip_unicode() {
        let path = PathBuf::from("/tmp/données/été.ln");
        assert_eq!(uri_to_path(&path_to_uri(&path)), path);
    }

    #[test]
    fn test_percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }
}
