//! Lue command-line interpreter.
//!
//! Reads a source file, runs the pipeline and exits 0 iff the run was
//! clean. Diagnostics are rendered to stderr; program output goes to
//! stdout through the standard kernel.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lue::StdoutKernel;

#[derive(Parser, Debug)]
#[command(name = "lue", version, about = "Interpreter for the Lue language")]
struct Args {
    /// Path to the .lue file to interpret.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let filename = args.path.display().to_string();

    let src = match fs::read_to_string(&args.path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("could not read file `{filename}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut kernel = StdoutKernel;
    if lue::interpret(&filename, &src, &mut kernel) {
        ExitCode::SUCCESS
    } else {
        eprintln!("error: could not interpret `{filename}` due to previous errors.");
        ExitCode::FAILURE
    }
}
