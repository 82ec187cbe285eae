//! Error taxonomy for the generator
//!
//! Every error is fatal to the run: discovery stops at the first error it
//! sees, emission aborts on the first failed type. Errors that originate
//! at a place in the input carry a byte range so the binary can render
//! them as `file:line:col: message`.

use std::path::PathBuf;

use text_size::TextRange;
use thiserror::Error;

use crate::base::LineIndex;

/// Any failure the generator can report.
#[derive(Debug, Error)]
pub enum Error {
    /// The front-end could not parse the header.
    #[error("{message}")]
    Syntax { message: String, range: TextRange },

    /// A doc comment carried a malformed annotation: unknown keyword,
    /// missing parameter, or a keyword that is not valid on the construct.
    #[error("{message}")]
    Annotation { message: String, range: TextRange },

    /// A declaration violates a structural constraint (anonymous record
    /// field, nested definition, named union, pointer to pointer, wrong
    /// underlying type for a pointer-flavored annotation, malformed list
    /// or tagged-union shape).
    #[error("{message}")]
    Structure { message: String, range: TextRange },

    /// Two types share one spelling in the registry.
    #[error("duplicate type name: \"{name}\"")]
    DuplicateType { name: String, range: TextRange },

    /// A `!custom` type misses its user-declared constructor.
    #[error("missing constructor for custom type!")]
    MissingCustomConstructor { range: TextRange },

    /// A `!custom` type misses its user-declared destructor.
    #[error("missing destructor for custom type!")]
    MissingCustomDestructor { range: TextRange },

    /// A field references a type the registry does not know.
    #[error("Unknown type: {name}")]
    UnknownType { name: String, range: TextRange },

    /// The root type named on the command line was never discovered.
    #[error("Did not find root type '{name}'.")]
    UnknownRoot { name: String },

    /// A name DFA ran out of node slots.
    #[error("too many nodes in DFA!")]
    DfaCapacity { range: TextRange },

    /// A parse option the front-end does not understand.
    #[error("unsupported parse option: '{option}'")]
    UnsupportedOption { option: String },

    /// The input header could not be read.
    #[error("unable to read '{}': {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created.
    #[error("unable to open '{}' for writing: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing generated code failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Byte range in the input header this error points at, if any.
    pub fn range(&self) -> Option<TextRange> {
        match self {
            Error::Syntax { range, .. }
            | Error::Annotation { range, .. }
            | Error::Structure { range, .. }
            | Error::DuplicateType { range, .. }
            | Error::MissingCustomConstructor { range }
            | Error::MissingCustomDestructor { range }
            | Error::UnknownType { range, .. }
            | Error::DfaCapacity { range } => Some(*range),
            Error::UnknownRoot { .. }
            | Error::UnsupportedOption { .. }
            | Error::Input { .. }
            | Error::OutputFile { .. }
            | Error::Io(_) => None,
        }
    }

    /// Render the error the way the binary prints it: source-located when
    /// the error points into the input, bare otherwise.
    pub fn render(&self, input_path: &std::path::Path, line_index: &LineIndex) -> String {
        match self.range() {
            Some(range) => {
                let pos = line_index.line_col(range.start());
                format!(
                    "{}:{}:{}: {}",
                    input_path.display(),
                    pos.line + 1,
                    pos.col + 1,
                    self
                )
            }
            None => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::new(start), TextSize::new(end))
    }

    #[test]
    fn located_errors_render_with_line_and_column() {
        let index = LineIndex::new("struct a {\n  int b;\n};\n");
        let err = Error::UnknownType {
            name: "foo_t".into(),
            range: range(13, 16),
        };
        let rendered = err.render(std::path::Path::new("in.h"), &index);
        assert_eq!(rendered, "in.h:2:3: Unknown type: foo_t");
    }

    #[test]
    fn unlocated_errors_render_bare() {
        let index = LineIndex::new("");
        let err = Error::UnknownRoot {
            name: "struct root".into(),
        };
        assert_eq!(
            err.render(std::path::Path::new("in.h"), &index),
            "Did not find root type 'struct root'."
        );
    }
}
