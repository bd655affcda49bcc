//! # Lue
//!
//! A small statically-typed expression language executed by a
//! tree-walking interpreter.
//!
//! The pipeline is linear: source text is lexed into spanned tokens,
//! parsed into an AST, bound into a typed intermediate representation
//! (name resolution plus type checking), and interpreted. No stage
//! aborts on error: problems accumulate in a diagnostic bag while later
//! stages keep working on degraded inputs, and the whole batch is
//! rendered at the end of the run.
//!
//! ```text
//! Source → Scanner → Tokens → Parser → AST → Binder → BIR → Evaluator
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use lue::{interpret, BufferKernel};
//!
//! let src = r#"
//!     fn add(a: int, b: int): int {
//!         return a + b
//!     }
//!
//!     fn main() {
//!         println(add(2, 40))
//!     }
//! "#;
//!
//! let mut kernel = BufferKernel::new();
//! let ok = interpret("add.lue", src, &mut kernel);
//! assert!(ok);
//! assert_eq!(kernel.lines(), ["42"]);
//! ```
//!
//! ## Language surface
//!
//! - `fn name(p: T, ...): R { ... }` function declarations; a top-level
//!   `main` must exist at runtime
//! - `class Name { field: T, ... }` class declarations, instantiated with
//!   `Name { field: expr, ... }` literals and read with `value.field`
//! - `let x: T = e` bindings (the annotation is optional), `x = e`
//!   assignment
//! - `if`/`else if`/`else`, unconditional `for` loops exited by `break`
//!   (optionally carrying the loop's value), `return`
//! - arrays `[1, 2, 3]` with `a[i]` indexing, `//` line comments
//! - types: `int`, `bool`, `string`, `[T]`, class names and `()`
//!
//! Program output goes exclusively through the host-provided [`Kernel`];
//! the interpreter itself never prints.

pub mod bir;
pub mod binder;
pub mod diagnostic;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod session;
pub mod span;

pub use error::{Error, Result};
pub use runtime::{BufferKernel, Evaluator, Kernel, StdoutKernel, Value};
pub use session::Session;
pub use span::{SourceFile, Span};

use tracing::debug;

/// Runs the whole pipeline over one source file: lex, parse, bind,
/// evaluate, then render any accumulated diagnostics to stderr.
///
/// Returns true iff the run was clean: evaluation succeeded and no
/// diagnostic was emitted by any stage.
pub fn interpret(filename: &str, src: &str, kernel: &mut dyn Kernel) -> bool {
    let mut sess = Session::new(filename, src);

    let items = parser::parse(&mut sess);
    let program = binder::bind(&items, &mut sess);

    let ok = match Evaluator::new(&program, kernel).run() {
        Ok(_) => true,
        Err(err) => {
            debug!(%err, "evaluation failed");
            false
        }
    };

    if !sess.diags.is_empty() {
        let mut stderr = std::io::stderr().lock();
        // Rendering to stderr can only fail if stderr itself is gone.
        let _ = sess.diags.render(&sess.file, &mut stderr);
    }

    ok && sess.diags.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_is_ok() {
        let mut kernel = BufferKernel::new();
        let ok = interpret("test.lue", "fn main() { println(1 + 1) }", &mut kernel);
        assert!(ok);
        assert_eq!(kernel.lines(), ["2"]);
    }

    #[test]
    fn type_error_fails_the_run_with_no_output() {
        let mut kernel = BufferKernel::new();
        let ok = interpret("test.lue", "fn main() { println(1 + true) }", &mut kernel);
        assert!(!ok);
        assert!(kernel.lines().is_empty());
    }

    #[test]
    fn bind_error_outside_main_still_fails_the_run() {
        let mut kernel = BufferKernel::new();
        let src = "fn unused() { oops }\nfn main() { println(1) }";
        let ok = interpret("test.lue", src, &mut kernel);
        assert!(!ok);
        // `main` itself still ran.
        assert_eq!(kernel.lines(), ["1"]);
    }

    #[test]
    fn missing_main_fails_the_run() {
        let mut kernel = BufferKernel::new();
        let ok = interpret("test.lue", "fn helper() { }", &mut kernel);
        assert!(!ok);
        assert_eq!(kernel.lines(), ["no `main` function found"]);
    }
}
