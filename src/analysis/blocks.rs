//! Block boundary resolution by brace-depth counting

use super::text::SourceText;

/// Result of resolving a block end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBoundary {
    /// Offset just past the matching `}`, or end-of-document
    pub end: usize,
    /// False when the document ended before the block closed (or no block
    /// was ever opened). Callers treat that as "rest of document".
    pub closed: bool,
}

/// Find the end of the first `{ … }` block at or after `start`.
///
/// Scanning continues from `start` on its own line and from column 0 on every
/// following line. The first `{` opens the block. A `}` seen before that
/// belongs to an enclosing block, so the declaration has no body of its own
/// and the boundary degrades to end-of-document. Braces inside strings and
/// comments are counted like any other.
pub fn resolve_block_end(source: &SourceText, start: usize) -> BlockBoundary {
    let text = source.as_str();
    let bytes = text.as_bytes();
    let start = start.min(bytes.len());

    let mut depth: usize = 0;
    let mut opened = false;

    'lines: for line in source.line_of(start)..source.line_count() {
        let from = source.line_start(line).max(start);
        let to = source.line_end(line);
        if from >= to {
            continue;
        }

        for (i, &byte) in bytes[from..to].iter().enumerate() {
            match byte {
                b'{' => {
                    depth += 1;
                    opened = true;
                }
                b'}' if !opened => break 'lines,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return BlockBoundary {
                            end: from + i + 1,
                            closed: true,
                        };
                    }
                }
                _ => {}
            }
        }
    }

    BlockBoundary {
        end: text.len(),
        closed: false,
    }
}
