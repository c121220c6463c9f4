//! Per-line terminator heuristic
//!
//! Every non-blank line must end with `;`, `:`, `{` or `}`. There is no
//! cross-line state, so continuation lines of a multi-line expression and
//! comment lines are reported too.

use super::text::SourceText;
use crate::models::diagnostic::{Diagnostic, LineRange};

pub const MISSING_TERMINATOR_CODE: &str = "missing-terminator";
pub const MISSING_TERMINATOR_MESSAGE: &str = "statement should end with a terminator";

const TERMINATORS: [char; 4] = [';', ':', '{', '}'];

pub fn lint(source: &SourceText) -> Vec<Diagnostic> {
    source
        .lines()
        .filter_map(|(index, line)| check_line(index, line))
        .collect()
}

fn check_line(index: usize, line: &str) -> Option<Diagnostic> {
    let content = line.trim_end();
    let last = content.chars().last()?;
    if TERMINATORS.contains(&last) {
        return None;
    }

    let end = content.encode_utf16().count() as u32;
    let start = end - last.len_utf16() as u32;
    Some(Diagnostic::warning(
        LineRange::new(index as u32, start, end),
        MISSING_TERMINATOR_CODE,
        MISSING_TERMINATOR_MESSAGE,
    ))
}
