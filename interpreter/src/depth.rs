use tracing::trace;

use crate::error::RuntimeError;

/// Current block nesting depth. Starts at 0; each `repeat` enters one level.
#[derive(Debug, Default)]
pub struct DepthTracker {
    depth: usize,
}

impl DepthTracker {
    pub fn new() -> Self {
        DepthTracker { depth: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter a block and return the new depth.
    pub fn enter(&mut self) -> usize {
        self.depth += 1;
        trace!(depth = self.depth, "enter");
        self.depth
    }

    /// Leave a block and return the new depth.
    pub fn exit(&mut self) -> Result<usize, RuntimeError> {
        if self.depth == 0 {
            return Err(RuntimeError::DepthUnderflow);
        }
        self.depth -= 1;
        trace!(depth = self.depth, "exit");
        Ok(self.depth)
    }
}
