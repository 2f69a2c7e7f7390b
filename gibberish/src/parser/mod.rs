pub mod error;
mod preprocess;

pub use error::ParseError;

use crate::Program;
use crate::outline::{self, Outline};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Clean the source into a Program. Cleaning never fails; structural
    /// problems surface when the program is outlined or executed.
    pub fn parse(&self) -> Program {
        Program {
            lines: preprocess::clean_lines(&self.source),
            source_id: self.file_id,
        }
    }

    /// Parse and check the block structure of the whole program up front.
    pub fn parse_checked(&self) -> Result<(Program, Outline), Vec<ParseError>> {
        let program = self.parse();
        let outline = outline::outline(&program)?;
        Ok((program, outline))
    }
}
