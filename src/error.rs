//! Runtime error types.
//!
//! Compile-time problems are diagnostics, collected in the session's bag
//! and rendered at the end of the run. The errors here are the ways an
//! evaluation itself can fail.

use thiserror::Error;

/// Result type used throughout the interpreter runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Ways evaluating a program can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The program has no `main` function to start from.
    #[error("no `main` function found")]
    MissingMain,

    /// Evaluation reached an error placeholder left behind by a parse or
    /// bind failure. The run fails cleanly; the diagnostics tell the rest.
    #[error("evaluated an erroneous expression")]
    Erroneous,

    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Array index outside the array's bounds.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds {
        /// The index the program asked for.
        index: i64,
        /// Length of the indexed array.
        len: usize,
    },
}
