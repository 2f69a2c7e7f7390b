use std::ops::Range;

use crate::line::LineStore;
use crate::scanner::RepeatCommand;

/// The body governed by one `repeat` command.
///
/// `body` is a range of line indices into the store, not a copy; replaying a
/// block reads those lines again each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub command: RepeatCommand,
    pub body: Range<usize>,
    /// Marker count every body line carries at minimum.
    pub depth: usize,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }
}

/// The maximal run of lines from `start` carrying at least `depth` markers.
/// An empty range is a legal body.
pub fn collect(store: &LineStore, start: usize, depth: usize) -> Range<usize> {
    let end = store
        .slice(start..store.len())
        .iter()
        .take_while(|line| line.depth() >= depth)
        .count();
    let start = start.min(store.len());
    start..start + end
}

/// Collect the body that follows `command` at `depth`.
pub fn collect_block(store: &LineStore, command: RepeatCommand, depth: usize) -> Block {
    let body = collect(store, command.line + 1, depth);
    Block {
        command,
        body,
        depth,
    }
}
