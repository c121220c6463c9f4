//! Immutable source snapshot with a line index
//!
//! Offsets are byte offsets into the text. Positions use UTF-16 columns so
//! they can be handed to editors unchanged.

use crate::models::lsp::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    /// Decode file contents; invalid UTF-8 sequences become U+FFFD
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offset of the first byte of `line`
    pub fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.text.len())
    }

    /// Offset just past the last content byte of `line` (before `\r\n` / `\n`)
    pub fn line_end(&self, line: usize) -> usize {
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        };
        let start = self.line_start(line);
        if end > start && self.text.as_bytes()[end - 1] == b'\r' {
            end - 1
        } else {
            end
        }
    }

    /// Content of `line` without its terminator
    pub fn line(&self, line: usize) -> Option<&str> {
        if line >= self.line_count() {
            return None;
        }
        Some(&self.text[self.line_start(line)..self.line_end(line)])
    }

    /// All lines with their 0-based index
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        (0..self.line_count()).filter_map(move |i| self.line(i).map(|l| (i, l)))
    }

    /// 0-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        self.line_starts.partition_point(|&start| start <= offset) - 1
    }

    pub fn position_of(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_of(offset);
        let start = self.line_start(line);
        let character = self.text[start..offset].encode_utf16().count();
        Position::new(line as u32, character as u32)
    }

    /// Inverse of [`position_of`](Self::position_of); out-of-range positions
    /// clamp to the end of the line or document.
    pub fn offset_of(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_count() {
            return self.text.len();
        }

        let start = self.line_start(line);
        let content = &self.text[start..self.line_end(line)];
        let target = position.character as usize;
        let mut units = 0;
        for (idx, ch) in content.char_indices() {
            if units >= target {
                return start + idx;
            }
            units += ch.len_utf16();
        }
        start + content.len()
    }

    /// Identifier touching `offset`, including a cursor placed right after it
    pub fn word_at(&self, offset: usize) -> Option<(usize, &str)> {
        let bytes = self.text.as_bytes();
        let offset = offset.min(bytes.len());

        let mut start = offset;
        while start > 0 && is_ident_byte(bytes[start - 1]) {
            start -= 1;
        }
        let mut end = offset;
        while end < bytes.len() && is_ident_byte(bytes[end]) {
            end += 1;
        }

        if start == end || bytes[start].is_ascii_digit() {
            return None;
        }
        Some((start, &self.text[start..end]))
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}
