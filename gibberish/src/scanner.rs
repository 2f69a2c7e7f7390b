use thiserror::Error;
use tracing::trace;

use crate::line::Line;
use crate::value::Value;

/// The only command keyword in the language.
pub const KEYWORD: &str = "repeat";

/// A `repeat N` command recognized on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatCommand {
    /// Index of the line the command was found on.
    pub line: usize,
    /// Byte offset of the keyword within the line.
    pub column: usize,
    /// The repetition count. Always `Value::Numeric` when produced by [`scan`].
    pub count: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("malformed repeat count on line {line}: expected digits after `repeat`")]
    MalformedCount { line: usize, column: usize },
    #[error("repeat count `{digits}` on line {line} is too large")]
    CountOverflow {
        line: usize,
        column: usize,
        digits: String,
    },
}

impl ScanError {
    pub fn line(&self) -> usize {
        match self {
            ScanError::MalformedCount { line, .. } | ScanError::CountOverflow { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ScanError::MalformedCount { column, .. }
            | ScanError::CountOverflow { column, .. } => *column,
        }
    }
}

/// Outcome of scanning one line from a given offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    /// A command and the offset just past its count.
    Found(RepeatCommand, usize),
    /// No keyword from the starting offset to the end of the line.
    NotFound(usize),
    /// The keyword matched but its count did not parse.
    ParseError(ScanError),
}

impl ScanResult {
    /// Collapse into the first command on the line, if any.
    pub fn into_command(self) -> Result<Option<RepeatCommand>, ScanError> {
        match self {
            ScanResult::Found(command, _) => Ok(Some(command)),
            ScanResult::NotFound(_) => Ok(None),
            ScanResult::ParseError(error) => Err(error),
        }
    }
}

/// Scan `line` for a `repeat` command starting at byte `offset`.
///
/// The keyword may appear anywhere on the line. It must be followed by
/// whitespace or the end of the line, so `repeated` is plain text while a bare
/// trailing `repeat` is a malformed command. Anything after the count is left
/// unscanned.
pub fn scan(line: &Line, offset: usize) -> ScanResult {
    let bytes = line.text.as_bytes();
    let keyword = KEYWORD.as_bytes();

    let mut at = offset;
    while at < bytes.len() {
        if bytes[at..].starts_with(keyword) {
            let after = at + keyword.len();
            match bytes.get(after) {
                None => {
                    return ScanResult::ParseError(ScanError::MalformedCount {
                        line: line.index,
                        column: at,
                    });
                }
                Some(b) if b.is_ascii_whitespace() => return parse_count(line, at, after),
                Some(_) => {}
            }
        }
        at += 1;
    }

    ScanResult::NotFound(bytes.len())
}

fn parse_count(line: &Line, column: usize, after_keyword: usize) -> ScanResult {
    let bytes = line.text.as_bytes();
    let start = after_keyword
        + bytes[after_keyword..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
    let end = start + bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();

    if start == end {
        return ScanResult::ParseError(ScanError::MalformedCount {
            line: line.index,
            column,
        });
    }

    let digits = &line.text[start..end];
    match digits.parse::<u64>() {
        Ok(count) => {
            trace!(line = line.index, column, count, "found repeat command");
            ScanResult::Found(
                RepeatCommand {
                    line: line.index,
                    column,
                    count: Value::Numeric(count),
                },
                end,
            )
        }
        Err(_) => ScanResult::ParseError(ScanError::CountOverflow {
            line: line.index,
            column,
            digits: digits.to_string(),
        }),
    }
}
