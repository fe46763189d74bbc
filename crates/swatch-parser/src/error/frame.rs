//! Plain-text code frames for log output.

use crate::span::Span;

/// 1-based line and column (in characters) of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(src.len());
    while !src.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Render the line containing `span` with a gutter and caret underline.
///
/// ```
/// use swatch_parser::{Span, error::code_frame};
///
/// let src = "{\n  \"a\": 12\n}";
/// assert_eq!(code_frame(src, Span::new(9..11)), "  2 |   \"a\": 12\n    |        ^^");
/// ```
pub fn code_frame(src: &str, span: Span) -> String {
    let (line, column) = line_col(src, span.start());
    let text = src.lines().nth(line - 1).unwrap_or_default();

    let remaining = text.chars().count().saturating_sub(column - 1);
    let end_column = line_col(src, span.end()).1;
    let width = if line_col(src, span.end()).0 == line {
        end_column.saturating_sub(column)
    } else {
        remaining
    }
    .clamp(1, remaining.max(1));

    let gutter = line.to_string().len();
    format!(
        "{:>pad$} | {text}\n{:>pad$} | {}{}",
        line,
        "",
        " ".repeat(column - 1),
        "^".repeat(width),
        pad = gutter + 2,
    )
}
