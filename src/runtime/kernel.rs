//! The host's side-effect surface.
//!
//! The interpreter never writes program output directly; every `println`
//! is routed through the kernel the host injected. The CLI passes a
//! stdout kernel, tests pass a buffering one and assert on the captured
//! lines.

/// The capability the host must provide to run programs.
pub trait Kernel {
    /// Writes one line of program output.
    fn println(&mut self, text: &str);
}

/// Kernel that writes program output to stdout.
#[derive(Debug, Default)]
pub struct StdoutKernel;

impl Kernel for StdoutKernel {
    fn println(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Kernel that captures program output in memory.
#[derive(Debug, Default)]
pub struct BufferKernel {
    lines: Vec<String>,
}

impl BufferKernel {
    /// Creates an empty buffer kernel.
    pub fn new() -> Self {
        BufferKernel::default()
    }

    /// The captured output lines, in emission order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Consumes the kernel, returning the captured lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl Kernel for BufferKernel {
    fn println(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}
