//! Compile-time diagnostics.
//!
//! Every front-end stage reports problems by appending to a shared [`Bag`];
//! nothing aborts the pipeline. At the end of a run the bag is rendered
//! against the source file, one block per diagnostic:
//!
//! ```text
//! error: cannot add `int` to `bool`
//! [examples.lue:13:2]
//!     println(1 + true)
//!               ^ here
//! ```

use std::io;

use crate::span::{SourceFile, Span};

/// An ordered, append-only collection of diagnostics.
#[derive(Debug, Default)]
pub struct Bag {
    diags: Vec<Diagnostic>,
}

/// A single user-facing error record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Main error message.
    pub msg: String,
    /// Primary location the message refers to.
    pub span: Span,
    /// Secondary annotations. Rendering currently shows only the first.
    pub labels: Vec<Label>,
}

/// A secondary annotation attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Annotation text, printed after the caret.
    pub msg: String,
    /// Location the caret points at.
    pub span: Span,
}

/// Builder for a [`Diagnostic`].
#[derive(Debug)]
pub struct Builder {
    msg: String,
    span: Span,
    labels: Vec<Label>,
}

impl Bag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Bag::default()
    }

    /// Returns true if no diagnostics have been emitted.
    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }

    /// Returns the number of emitted diagnostics.
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Appends a diagnostic. Emission order is preserved; nothing is
    /// deduplicated.
    pub fn push(&mut self, diag: Diagnostic) {
        self.diags.push(diag);
    }

    /// Iterates over the emitted diagnostics in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diags.iter()
    }

    /// Renders every diagnostic against `file`, writing to `out`.
    pub fn render(&self, file: &SourceFile, out: &mut dyn io::Write) -> io::Result<()> {
        for diag in &self.diags {
            diag.render(file, out)?;
        }
        Ok(())
    }
}

impl Diagnostic {
    /// Starts building a diagnostic with a message and primary span.
    pub fn builder(msg: impl Into<String>, span: Span) -> Builder {
        Builder {
            msg: msg.into(),
            span,
            labels: Vec::new(),
        }
    }

    fn render(&self, file: &SourceFile, out: &mut dyn io::Write) -> io::Result<()> {
        let line = file.line(self.span.start);
        let line_start = file.line_pos(line).unwrap_or(0);
        let col = self.span.start - line_start + 1;

        writeln!(out, "error: {}", self.msg)?;
        writeln!(out, "[{}:{}:{}]", file.name(), col, line + 1)?;
        writeln!(out, "    {}", file.line_text(line).unwrap_or(""))?;

        if let Some(label) = self.labels.first() {
            let caret_col = label.span.start.saturating_sub(line_start);
            writeln!(out, "    {}^ {}", " ".repeat(caret_col), label.msg)?;
        }

        Ok(())
    }
}

impl Builder {
    /// Attaches a label at the diagnostic's primary span.
    pub fn label(mut self, msg: impl Into<String>) -> Builder {
        self.labels.push(Label {
            msg: msg.into(),
            span: self.span,
        });
        self
    }

    /// Attaches a label at an explicit span.
    pub fn label_at(mut self, msg: impl Into<String>, span: Span) -> Builder {
        self.labels.push(Label {
            msg: msg.into(),
            span,
        });
        self
    }

    /// Finishes the diagnostic without emitting it.
    pub fn build(self) -> Diagnostic {
        Diagnostic {
            msg: self.msg,
            span: self.span,
            labels: self.labels,
        }
    }

    /// Finishes the diagnostic and appends it to `bag`.
    pub fn emit(self, bag: &mut Bag) {
        bag.push(self.build());
    }
}
