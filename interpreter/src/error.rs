use std::io;
use std::ops::Range;

use gibberish::line::Line;
use gibberish::scanner::ScanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("unbalanced depth: line {line} has {found} depth marker(s), at most {allowed} allowed here")]
    UnbalancedDepth {
        line: usize,
        found: usize,
        allowed: usize,
    },
    #[error("depth underflow: block exit without a matching enter")]
    DepthUnderflow,
    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },
    #[error("nesting too deep: depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },
    #[error("output limit of {limit} line(s) exceeded")]
    OutputLimitExceeded { limit: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Errors that fail only the command being expanded. Everything else ends the run.
    pub fn is_command_local(&self) -> bool {
        matches!(self, RuntimeError::Scan(_) | RuntimeError::TypeError { .. })
    }
}

/// A runtime error enriched with source location information.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct DiagnosticError {
    pub error: RuntimeError,
    pub span: Option<Range<usize>>,
    pub source_id: usize,
    /// Index of the originating line in the line store.
    pub line: Option<usize>,
}

impl DiagnosticError {
    /// Attach the location of `line` to `error`.
    pub fn at(error: impl Into<RuntimeError>, line: &Line, source_id: usize) -> Self {
        DiagnosticError {
            error: error.into(),
            span: Some(line.span.clone()),
            source_id,
            line: Some(line.index),
        }
    }

    pub fn is_command_local(&self) -> bool {
        self.error.is_command_local()
    }
}

impl From<RuntimeError> for DiagnosticError {
    fn from(error: RuntimeError) -> Self {
        DiagnosticError {
            error,
            span: None,
            source_id: 0,
            line: None,
        }
    }
}
