use std::ops::Range;

use tracing::debug;

use crate::Program;
use crate::collector;
use crate::line::LineStore;
use crate::parser::ParseError;
use crate::scanner::{self, RepeatCommand, ScanResult};

/// Index of a node in an [`Outline`].
pub type NodeId = usize;

/// One `repeat` block in the static structure of a program.
#[derive(Debug, Clone)]
pub struct OutlineNode {
    pub command: RepeatCommand,
    pub body: Range<usize>,
    pub depth: usize,
    /// Nested blocks, in source order.
    pub children: Vec<NodeId>,
    /// Body lines that are printed rather than executed.
    pub leaf_lines: usize,
}

impl OutlineNode {
    pub fn count(&self) -> u64 {
        self.command.count.as_numeric().unwrap_or(0)
    }
}

/// The block tree of a program, built without executing it.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    nodes: Vec<OutlineNode>,
    roots: Vec<NodeId>,
    /// Non-fatal findings, e.g. bodies that can never run.
    pub warnings: Vec<ParseError>,
}

impl Outline {
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &OutlineNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of lines executing the program will print. Saturates at `u64::MAX`.
    pub fn expected_output(&self) -> u64 {
        self.roots
            .iter()
            .fold(0u64, |total, &id| total.saturating_add(self.output_of(id)))
    }

    fn output_of(&self, id: NodeId) -> u64 {
        let node = &self.nodes[id];
        let per_repetition = node
            .children
            .iter()
            .fold(node.leaf_lines as u64, |total, &child| {
                total.saturating_add(self.output_of(child))
            });
        node.count().saturating_mul(per_repetition)
    }

    /// Depth-first walk of the tree, yielding each node with its id.
    pub fn walk(&self) -> Vec<(NodeId, &OutlineNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.push((id, node));
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// Build the block tree of `program`, reporting every structural problem.
///
/// Uses the same scanner and collector rules as execution: a failed command
/// skips its own body, and a line is unbalanced when it carries more markers
/// than the innermost open block allows.
pub fn outline(program: &Program) -> Result<Outline, Vec<ParseError>> {
    let mut builder = Builder {
        lines: &program.lines,
        file_id: program.source_id,
        outline: Outline::default(),
        errors: Vec::new(),
    };
    builder.walk(0..program.lines.len(), 0, None);

    let Builder {
        outline, errors, ..
    } = builder;
    debug!(
        blocks = outline.len(),
        errors = errors.len(),
        "outlined program"
    );

    if errors.is_empty() {
        Ok(outline)
    } else {
        let mut diagnostics = errors;
        diagnostics.extend(outline.warnings);
        diagnostics.sort_by_key(|d| d.line);
        Err(diagnostics)
    }
}

struct Builder<'a> {
    lines: &'a LineStore,
    file_id: usize,
    outline: Outline,
    errors: Vec<ParseError>,
}

impl Builder<'_> {
    fn walk(&mut self, range: Range<usize>, depth: usize, parent: Option<NodeId>) {
        let lines = self.lines;
        let mut index = range.start;

        while index < range.end {
            let line = &lines[index];
            if line.depth() > depth {
                self.errors
                    .push(ParseError::unbalanced(line, depth, self.file_id));
                index += 1;
                continue;
            }

            match scanner::scan(line, depth) {
                ScanResult::Found(command, _) => {
                    let block = collector::collect_block(lines, command, depth + 1);
                    let id = self.outline.nodes.len();
                    if block.command.count.as_numeric() == Some(0) && !block.is_empty() {
                        self.outline.warnings.push(ParseError::warning(
                            "`repeat 0` body never runs",
                            line,
                            self.file_id,
                        ));
                    }
                    self.outline.nodes.push(OutlineNode {
                        command: block.command,
                        body: block.body.clone(),
                        depth: depth + 1,
                        children: Vec::new(),
                        leaf_lines: 0,
                    });
                    match parent {
                        Some(parent) => self.outline.nodes[parent].children.push(id),
                        None => self.outline.roots.push(id),
                    }
                    self.walk(block.body.clone(), depth + 1, Some(id));
                    index = block.body.end;
                }
                ScanResult::NotFound(_) => {
                    if let Some(parent) = parent {
                        self.outline.nodes[parent].leaf_lines += 1;
                    }
                    index += 1;
                }
                ScanResult::ParseError(error) => {
                    self.errors
                        .push(ParseError::from_scan(&error, line, self.file_id));
                    index = collector::collect(lines, index + 1, depth + 1).end;
                }
            }
        }
    }
}
