//! Shared state threaded through the front-end stages.

use crate::diagnostic::Bag;
use crate::span::SourceFile;

/// Bundles the source file being compiled with the diagnostic sink every
/// stage reports into. The session lives for the whole run.
#[derive(Debug)]
pub struct Session {
    /// The file being interpreted.
    pub file: SourceFile,
    /// Accumulated diagnostics from lexing, parsing and binding.
    pub diags: Bag,
}

impl Session {
    /// Creates a session for a single source file.
    pub fn new(filename: impl Into<String>, src: impl Into<String>) -> Self {
        Session {
            file: SourceFile::new(filename, src),
            diags: Bag::new(),
        }
    }
}
