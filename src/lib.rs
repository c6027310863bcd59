//! Translates `.jack` source files into textual instructions for a
//! stack-based virtual machine.
//!
//! The pipeline is four fused pieces, leaves first: a [`lexer::Tokenizer`]
//! produces a forward cursor over tokens; a [`symbol_table::SymbolTable`]
//! tracks scoped identifiers; a [`vm_writer::InstructionWriter`] serializes
//! VM commands to text; and a [`translator::Translator`] drives all three as
//! a recursive-descent recognizer with no intermediate parse tree.
//!
//! ```
//! let vm_text = jackc::translate_source(
//!     "class Main { function void main() { return; } }"
//! ).unwrap();
//! assert_eq!(vm_text, "function Main.main 0\npush constant 0\nreturn\n");
//! ```

pub mod error;
pub mod lexer;
pub mod symbol_table;
pub mod token;
pub mod translator;
pub mod vm_writer;

use std::fs;
use std::io::BufWriter;
use std::path::Path;

pub use error::CompileError;
pub use translator::Translator;

/// Translates a `.jack` source string to VM text, in memory. Useful for
/// tests and embedders that don't want a file on disk.
pub fn translate_source(source: &str) -> Result<String, CompileError> {
    let translator = Translator::new(source, Vec::new());
    let bytes = translator.translate()?;
    Ok(String::from_utf8(bytes).expect("VM writer only ever emits ASCII/UTF-8 text"))
}

/// Translates a single `.jack` file to a `.vm` file beside it, overwriting
/// any existing output. Returns the output path on success.
pub fn translate_file(input: &Path) -> Result<std::path::PathBuf, CompileError> {
    let source = fs::read_to_string(input)?;
    let output_path = input.with_extension("vm");

    let file = fs::File::create(&output_path)?;
    let translator = Translator::new(&source, BufWriter::new(file));
    translator.translate()?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_minimal_function() {
        let vm = translate_source("class Main { function void main() { return; } }").unwrap();
        assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
    }

    #[test]
    fn reports_structural_failure_with_line() {
        let err = translate_source("class Main { function void main( return; } }").unwrap_err();
        match err {
            CompileError::Structural { .. } => {}
            other => panic!("expected a structural error, got {other:?}"),
        }
    }
}
