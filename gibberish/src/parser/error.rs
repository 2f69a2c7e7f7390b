use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

use crate::line::Line;
use crate::scanner::ScanError;

/// Structural errors with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    /// Index of the offending line in the line store.
    pub line: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, line: &Line, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span: line.span.clone(),
            file_id,
            line: line.index,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>, line: &Line, file_id: usize) -> Self {
        ParseError {
            severity: Severity::Warning,
            ..ParseError::error(message, line, file_id)
        }
    }

    /// A scanner failure, labelled from the keyword to the end of the line.
    pub fn from_scan(error: &ScanError, line: &Line, file_id: usize) -> Self {
        let column = error.column().min(line.text.len());
        let mut parse_error = ParseError::error(error.to_string(), line, file_id);
        parse_error.span = line.span.start + column..line.span.end;
        parse_error.with_note("a repeat count is a decimal integer, e.g. `repeat 3`")
    }

    /// A line whose depth markers no open block can own.
    pub fn unbalanced(line: &Line, allowed: usize, file_id: usize) -> Self {
        ParseError::error(
            format!(
                "unbalanced depth: line has {} depth marker(s), at most {} allowed here",
                line.depth(),
                allowed
            ),
            line,
            file_id,
        )
        .with_note("each `>` nests one level deeper and must follow a `repeat` that opens it")
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Bug)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
