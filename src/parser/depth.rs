//! Parse-time nesting guard.

use tracing::warn;

use crate::parser::types::MAX_PARSER_DEPTH;

/// Counts how deeply the parser has recursed into nested constructs.
#[derive(Debug, Clone)]
pub struct DepthGuard {
    depth: usize,
    max: usize,
}

impl Default for DepthGuard {
    fn default() -> Self {
        Self::new(MAX_PARSER_DEPTH)
    }
}

impl DepthGuard {
    pub fn new(max: usize) -> Self {
        Self { depth: 0, max }
    }

    /// Enter one level. Returns false, leaving the counter untouched, when
    /// the bound is already reached.
    pub fn push(&mut self) -> bool {
        if self.depth >= self.max {
            warn!(max = self.max, "parser nesting limit reached");
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
