//! Syntactic analysis for Lue.
//!
//! Parses the token stream into spanned items and expression trees.

pub mod ast;
mod descent;

pub use descent::{parse, Parser};
