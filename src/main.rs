//! CLI driver: argument handling, directory traversal, and file open/close
//! around the translation core in `lib.rs`. This file is the external
//! collaborator. Everything here is plumbing around the pipeline, not part
//! of it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

/// Translate `.jack` source files to stack VM instruction text.
#[derive(Parser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// A `.jack` file, or a directory whose immediate `.jack` children are
    /// each compiled (non-recursive).
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jackc=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.path.exists() {
        error!(path = %cli.path.display(), "path does not exist");
        eprintln!("error: no such file or directory: {}", cli.path.display());
        return ExitCode::FAILURE;
    }

    let inputs = match collect_inputs(&cli.path) {
        Ok(inputs) => inputs,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if inputs.is_empty() {
        eprintln!(
            "error: no .jack files found in {}",
            cli.path.display()
        );
        return ExitCode::FAILURE;
    }

    let mut failures = 0usize;
    for input in &inputs {
        match jackc::translate_file(input) {
            Ok(output) => {
                info!(
                    input = %input.display(),
                    output = %output.display(),
                    "compiled"
                );
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "compilation failed");
                eprintln!("error: {}: {}", input.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolves the CLI path to the list of `.jack` files to compile: the path
/// itself if it's a file, or its immediate `.jack` children if it's a
/// directory (non-recursive).
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>, jackc::CompileError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        return Err(jackc::CompileError::InvalidPath(path.to_path_buf()));
    }

    let mut inputs = Vec::new();
    let entries = std::fs::read_dir(path)?;

    for entry in entries {
        let entry_path = entry?.path();
        if entry_path.is_file() && entry_path.extension().is_some_and(|ext| ext == "jack") {
            inputs.push(entry_path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_mode_is_non_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jack"), "class A {}").unwrap();
        std::fs::write(dir.path().join("b.jack"), "class B {}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("c.jack"), "class C {}").unwrap();

        let inputs = collect_inputs(dir.path()).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jack", "b.jack"]);
    }

    #[test]
    fn single_file_mode_returns_that_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.jack");
        std::fs::write(&file, "class Only {}").unwrap();

        let inputs = collect_inputs(&file).unwrap();
        assert_eq!(inputs, vec![file]);
    }
}
