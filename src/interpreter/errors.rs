//! Evaluation Outcome
//!
//! `break` and `continue` unwind through ordinary return values instead of
//! errors. Every evaluator that runs a sub-tree hands `Break`/`Continue`
//! straight back to its caller; only loops consume them.

use crate::status::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    Status(Status),
    Break,
    Continue,
}

impl EvalOutcome {
    pub const SUCCESS: EvalOutcome = EvalOutcome::Status(Status::SUCCESS);

    /// The status carried by a normal completion.
    pub fn status(self) -> Option<Status> {
        match self {
            Self::Status(status) => Some(status),
            Self::Break | Self::Continue => None,
        }
    }
}

impl From<Status> for EvalOutcome {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

/// Unwrap a normal completion or return the signal from the enclosing
/// function.
macro_rules! propagate {
    ($outcome:expr) => {
        match $outcome {
            $crate::interpreter::errors::EvalOutcome::Status(status) => status,
            signal => return signal,
        }
    };
}

pub(crate) use propagate;
