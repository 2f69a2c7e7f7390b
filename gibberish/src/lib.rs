pub mod collector;
pub mod line;
pub mod outline;
pub mod parser;
pub mod scanner;
pub mod value;

use crate::line::LineStore;

/// A preprocessed gibberish program.
#[derive(Debug, Clone)]
pub struct Program {
    /// Cleaned source lines, in file order.
    pub lines: LineStore,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Program {
    /// Build a program directly from already-cleaned lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Program {
            lines: LineStore::from_texts(lines),
            source_id: 0,
        }
    }
}
