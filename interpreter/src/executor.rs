use std::io::Write;
use std::ops::Range;

use gibberish::Program;
use gibberish::collector::{self, Block};
use gibberish::line::{Line, LineStore};
use gibberish::scanner::{self, RepeatCommand, ScanResult};
use tracing::{debug, trace, warn};

use crate::depth::DepthTracker;
use crate::error::{DiagnosticError, RuntimeError};

/// Deepest block nesting executed before giving up.
pub const MAX_DEPTH: usize = 256;

/// Limits applied while executing a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum nesting depth of `repeat` blocks.
    pub max_depth: usize,
    /// Maximum number of lines to print, if any.
    pub output_limit: Option<u64>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions {
            max_depth: MAX_DEPTH,
            output_limit: None,
        }
    }
}

/// What a completed run did.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub lines_emitted: u64,
    /// Expansions of `repeat` commands that ran to completion, nested ones included.
    pub commands_executed: u64,
    /// Top-level commands that failed without ending the run.
    pub diagnostics: Vec<DiagnosticError>,
}

impl ExecutionReport {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Execute a program with default options.
pub fn execute_program(
    program: &Program,
    output: &mut dyn Write,
) -> Result<ExecutionReport, DiagnosticError> {
    execute_program_with(program, output, &ExecutionOptions::default())
}

/// Execute a program with explicit limits.
pub fn execute_program_with(
    program: &Program,
    output: &mut dyn Write,
    options: &ExecutionOptions,
) -> Result<ExecutionReport, DiagnosticError> {
    let mut tracker = DepthTracker::new();
    let mut executor = Executor::new(program, output, options);
    executor.run(&mut tracker)?;
    Ok(executor.finish())
}

/// Where the traversal of one line range stands.
///
/// A block's level is entered when its command is found and left once the
/// block is done with, on every path out of `Collecting` and `Replaying`.
enum Phase {
    AwaitingCommand(usize),
    Collecting(RepeatCommand),
    Replaying(Block),
    Done,
}

/// The repeat executor for one program run.
pub struct Executor<'a> {
    lines: &'a LineStore,
    source_id: usize,
    output: &'a mut dyn Write,
    options: &'a ExecutionOptions,
    report: ExecutionReport,
}

impl<'a> Executor<'a> {
    pub fn new(
        program: &'a Program,
        output: &'a mut dyn Write,
        options: &'a ExecutionOptions,
    ) -> Self {
        Executor {
            lines: &program.lines,
            source_id: program.source_id,
            output,
            options,
            report: ExecutionReport::default(),
        }
    }

    /// Run the whole program. `tracker` starts at depth 0 and is back at 0 afterwards,
    /// whether or not the run fails.
    pub fn run(&mut self, tracker: &mut DepthTracker) -> Result<(), DiagnosticError> {
        self.traverse(0..self.lines.len(), tracker)
    }

    pub fn finish(self) -> ExecutionReport {
        self.report
    }

    /// Execute the lines in `range` at the tracker's current depth.
    fn traverse(
        &mut self,
        range: Range<usize>,
        tracker: &mut DepthTracker,
    ) -> Result<(), DiagnosticError> {
        let level = tracker.depth();
        let mut phase = Phase::AwaitingCommand(range.start);

        loop {
            phase = match phase {
                Phase::AwaitingCommand(index) => {
                    match self.next_command(index, range.end, level) {
                        Ok(Some(command)) => {
                            tracker.enter();
                            Phase::Collecting(command)
                        }
                        Ok(None) => Phase::Done,
                        Err(error) => {
                            let line = error.line.unwrap_or(index);
                            self.recover(error, line, level)?
                        }
                    }
                }
                Phase::Collecting(command) => {
                    let line = command.line;
                    match self.collect(command, tracker) {
                        Ok(block) => Phase::Replaying(block),
                        Err(error) => {
                            tracker.exit()?;
                            self.recover(error, line, level)?
                        }
                    }
                }
                Phase::Replaying(block) => {
                    let replayed = self.replay(&block, tracker);
                    tracker.exit()?;
                    match replayed {
                        Ok(()) => Phase::AwaitingCommand(block.body.end),
                        Err(error) => self.recover(error, block.command.line, level)?,
                    }
                }
                Phase::Done => return Ok(()),
            };
        }
    }

    /// Advance from `index` to the next command, printing body lines on the way.
    fn next_command(
        &mut self,
        mut index: usize,
        end: usize,
        level: usize,
    ) -> Result<Option<RepeatCommand>, DiagnosticError> {
        let lines = self.lines;

        while index < end {
            let line = &lines[index];
            let markers = line.depth();
            if markers > level {
                return Err(self.locate(
                    RuntimeError::UnbalancedDepth {
                        line: line.index,
                        found: markers,
                        allowed: level,
                    },
                    line,
                ));
            }

            match scanner::scan(line, level) {
                ScanResult::Found(command, _) => return Ok(Some(command)),
                ScanResult::NotFound(_) if level > 0 => self.emit(line, level)?,
                ScanResult::NotFound(_) => trace!(line = line.index, "skipping top-level text"),
                ScanResult::ParseError(error) => return Err(self.locate(error, line)),
            }
            index += 1;
        }

        Ok(None)
    }

    /// Gather the body of `command` at the depth just entered.
    fn collect(
        &self,
        command: RepeatCommand,
        tracker: &DepthTracker,
    ) -> Result<Block, DiagnosticError> {
        let depth = tracker.depth();
        if depth > self.options.max_depth {
            return Err(self.locate(
                RuntimeError::NestingTooDeep {
                    depth,
                    limit: self.options.max_depth,
                },
                &self.lines[command.line],
            ));
        }

        Ok(collector::collect_block(self.lines, command, depth))
    }

    /// Run `block`'s body once per repetition. An empty body only consumes the count.
    fn replay(&mut self, block: &Block, tracker: &mut DepthTracker) -> Result<(), DiagnosticError> {
        let lines = self.lines;
        let count = block.command.count.as_numeric().ok_or_else(|| {
            self.locate(
                RuntimeError::TypeError {
                    expected: "Numeric",
                    got: block.command.count.type_name(),
                },
                &lines[block.command.line],
            )
        })?;

        debug!(
            line = block.command.line,
            depth = block.depth,
            count,
            body = block.len(),
            "replaying repeat"
        );

        if !block.is_empty() {
            for _ in 0..count {
                self.traverse(block.body.clone(), tracker)?;
            }
        }

        self.report.commands_executed += 1;
        Ok(())
    }

    /// A failing top-level command is recorded and skipped along with its body.
    /// Below the top level every error propagates to the enclosing command.
    fn recover(
        &mut self,
        error: DiagnosticError,
        command_line: usize,
        level: usize,
    ) -> Result<Phase, DiagnosticError> {
        if level > 0 || !error.is_command_local() {
            return Err(error);
        }

        warn!(line = command_line, %error, "repeat command failed");
        let resume = collector::collect(self.lines, command_line + 1, level + 1).end;
        self.report.diagnostics.push(error);
        Ok(Phase::AwaitingCommand(resume))
    }

    fn emit(&mut self, line: &Line, level: usize) -> Result<(), DiagnosticError> {
        if let Some(limit) = self.options.output_limit {
            if self.report.lines_emitted >= limit {
                return Err(self.locate(RuntimeError::OutputLimitExceeded { limit }, line));
            }
        }

        let text = line.content_at(level);
        trace!(line = line.index, text, "emit");
        writeln!(self.output, "{}", text).map_err(|e| self.locate(e, line))?;
        self.report.lines_emitted += 1;
        Ok(())
    }

    fn locate(&self, error: impl Into<RuntimeError>, line: &Line) -> DiagnosticError {
        DiagnosticError::at(error, line, self.source_id)
    }
}
