//! Command Status Codes
//!
//! Every evaluation and every command returns a `Status`. The numeric values
//! are stable: hosts compare against them and `$?` prints them.
//!
//! Codes below `CMD_ERROR` belong to the interpreter itself. Built-in
//! commands number their own failures from `CMD_ERROR + 1` upward, so the
//! same value can mean different things for different commands.

use serde::Serialize;
use std::fmt;

/// Bound shared by the parse-time nesting guard and the run-time
/// `eval`/function-call depth counter.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Status(u32);

impl Status {
    pub const SUCCESS: Status = Status(0);
    pub const ERROR: Status = Status(1);
    pub const SYNTAX_ERROR: Status = Status(2);
    pub const UNCLOSED_SIMPLE_QUOTES: Status = Status(3);
    pub const UNCLOSED_DOUBLE_QUOTES: Status = Status(4);
    pub const UNCLOSED_BACK_QUOTES: Status = Status(5);
    pub const UNCLOSED_PARENTHESES: Status = Status(6);
    pub const UNCLOSED_BRACKETS: Status = Status(7);
    pub const UNCLOSED_SQR_BRACKETS: Status = Status(8);
    pub const UNCLOSED_SUBCOMMAND: Status = Status(9);
    pub const UNCLOSED_VARIABLE: Status = Status(10);
    pub const INVALID_VARIABLE_NAME: Status = Status(11);
    pub const UNEXPECTED_TOKEN: Status = Status(12);
    pub const UNEXPECTED_EOF: Status = Status(13);
    pub const ARG_OUT_OF_RANGE: Status = Status(14);
    pub const EMPTY_BLOCK: Status = Status(15);
    pub const UNFINISHED_KEYWORD_IF: Status = Status(16);
    pub const MISSING_KEYWORD_THEN: Status = Status(17);
    pub const UNFINISHED_KEYWORD_LOOP: Status = Status(18);
    pub const UNFINISHED_KEYWORD_FOR: Status = Status(19);
    pub const MISSING_KEYWORD_IN: Status = Status(20);
    pub const UNFINISHED_KEYWORD_WHILE: Status = Status(21);
    pub const UNFINISHED_KEYWORD_UNTIL: Status = Status(22);
    pub const MISSING_KEYWORD_DO: Status = Status(23);
    pub const INVALID_FUNCTION_NAME: Status = Status(24);
    pub const INVALID_FUNCTION_BODY: Status = Status(25);
    pub const BAD_ENCODING: Status = Status(26);
    pub const COMMAND_NOT_FOUND: Status = Status(27);
    pub const MAX_DEPTH_REACHED: Status = Status(28);

    /// Base of the command-specific range.
    pub const CMD_ERROR: Status = Status(42);

    /// Status for the `n`-th error of a built-in command (`CMD_ERROR + n`).
    pub const fn command(n: u32) -> Status {
        Status(Self::CMD_ERROR.0 + n)
    }

    pub const fn from_code(code: u32) -> Status {
        Status(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }

    pub fn is_syntax_error(self) -> bool {
        self >= Self::SYNTAX_ERROR && self <= Self::MAX_DEPTH_REACHED
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> i32 {
        i32::try_from(status.0).unwrap_or(i32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_values() {
        assert_eq!(Status::SUCCESS.code(), 0);
        assert_eq!(Status::UNEXPECTED_TOKEN.code(), 12);
        assert_eq!(Status::BAD_ENCODING.code(), 26);
        assert_eq!(Status::MAX_DEPTH_REACHED.code(), 28);
        assert_eq!(Status::command(4).code(), 46);
    }

    #[test]
    fn test_syntax_error_range() {
        assert!(!Status::SUCCESS.is_syntax_error());
        assert!(!Status::ERROR.is_syntax_error());
        assert!(Status::SYNTAX_ERROR.is_syntax_error());
        assert!(Status::MISSING_KEYWORD_DO.is_syntax_error());
        assert!(Status::MAX_DEPTH_REACHED.is_syntax_error());
        assert!(!Status::CMD_ERROR.is_syntax_error());
    }

    #[test]
    fn test_display_is_numeric() {
        assert_eq!(Status::COMMAND_NOT_FOUND.to_string(), "27");
        assert_eq!(i32::from(Status::command(1)), 43);
    }
}
