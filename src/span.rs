//! Source positions and files.
//!
//! Every token and syntax node carries a [`Span`], a half-open byte range
//! into the interpreted file. [`SourceFile`] owns the text together with a
//! precomputed line-start table so diagnostics can map byte offsets back to
//! lines and columns cheaply.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte covered by this span.
    pub start: usize,
    /// Byte offset one past the last byte covered by this span.
    pub end: usize,
}

impl Span {
    /// Creates a new span covering `[start, end)`.
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Creates an empty span positioned at `pos`.
    pub fn empty(pos: usize) -> Self {
        Span::new(pos, pos)
    }

    /// Returns a new span that encloses both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }

    /// Returns the number of bytes covered by this span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// An immutable source file: name, text and line-start offsets.
///
/// The line table holds the byte offset of every line beginning (offset 0
/// plus the position following each `\n`), kept sorted so lookups are a
/// binary search.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    src: String,
    lines: Vec<usize>,
}

impl SourceFile {
    /// Creates a source file, computing its line-start table.
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        let src = src.into();
        let mut lines = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                lines.push(i + 1);
            }
        }
        SourceFile {
            name: name.into(),
            src,
            lines,
        }
    }

    /// Returns the file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full source text.
    pub fn src(&self) -> &str {
        &self.src
    }

    /// Returns the 0-based line index containing byte offset `pos`.
    pub fn line(&self, pos: usize) -> usize {
        self.lines.partition_point(|&start| start <= pos) - 1
    }

    /// Returns the byte offset at which `line` (0-based) begins, or `None`
    /// if the file has no such line.
    pub fn line_pos(&self, line: usize) -> Option<usize> {
        self.lines.get(line).copied()
    }

    /// Returns the text of `line` (0-based) without its trailing newline,
    /// or `None` if the file has no such line.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let lo = self.line_pos(line)?;
        let hi = self
            .line_pos(line + 1)
            .unwrap_or(self.src.len());
        Some(self.src[lo..hi].trim_end_matches(['\n', '\r']))
    }
}
