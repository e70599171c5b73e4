// src/commands/test_cmd/mod.rs
use std::cmp::Ordering;

use regex_lite::Regex;
use thiserror::Error;

use crate::commands::Command;
use crate::interpreter::Session;
use crate::parser::types::is_number;
use crate::status::Status;

/// Status of a well-formed expression that evaluated to false.
pub const TEST_FALSE: Status = Status::command(4);

/// Parenthesis nesting bound of a test expression.
const MAX_TEST_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TestError {
    #[error("Error: Unclosed parenthesis in the command.")]
    UnclosedParenthesis,
    #[error("Error: The expression provided is malformed.")]
    MalformedExpression,
    #[error("Error: The regular expression is malformed.")]
    MalformedRegex,
}

impl TestError {
    pub fn status(self) -> Status {
        match self {
            Self::UnclosedParenthesis => Status::command(1),
            Self::MalformedExpression => Status::command(2),
            Self::MalformedRegex => Status::command(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    NotEquals,
    Matches,
    Greater,
    Less,
    GreaterOrEquals,
    LessOrEquals,
    Empty,
    NonEmpty,
    Or,
    And,
    OpenParenthesis,
    CloseParenthesis,
}

fn operator(token: &str) -> Option<Operator> {
    let op = match token {
        "-eq" | "==" => Operator::Equals,
        "-ne" | "!=" => Operator::NotEquals,
        "=~" => Operator::Matches,
        "-gt" | ">" => Operator::Greater,
        "-lt" | "<" => Operator::Less,
        "-ge" | ">=" => Operator::GreaterOrEquals,
        "-le" | "<=" => Operator::LessOrEquals,
        "-z" => Operator::Empty,
        "-n" => Operator::NonEmpty,
        "-o" | "||" => Operator::Or,
        "-a" | "&&" => Operator::And,
        "(" => Operator::OpenParenthesis,
        ")" => Operator::CloseParenthesis,
        _ => return None,
    };
    Some(op)
}

/// Evaluate a test expression given as separate tokens.
///
/// ```text
/// or   := and (("-o" | "||") and)*
/// and  := expr (("-a" | "&&") expr)*
/// expr := "(" or ")" | "-z" X | "-n" X | X op Y
/// ```
pub fn evaluate_test(tokens: &[String]) -> Result<bool, TestError> {
    let mut parser = TestParser { tokens, pos: 0, depth: 0 };
    let result = parser.or()?;
    if parser.pos < tokens.len() {
        return Err(TestError::MalformedExpression);
    }
    Ok(result)
}

struct TestParser<'a> {
    tokens: &'a [String],
    pos: usize,
    depth: usize,
}

impl<'a> TestParser<'a> {
    fn operator_at(&self, pos: usize) -> Option<Operator> {
        self.tokens.get(pos).and_then(|t| operator(t))
    }

    fn or(&mut self) -> Result<bool, TestError> {
        if self.depth >= MAX_TEST_DEPTH {
            return Err(TestError::MalformedExpression);
        }
        self.depth += 1;

        let mut left = self.and()?;
        while self.operator_at(self.pos) == Some(Operator::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = left || right;
        }

        self.depth -= 1;
        Ok(left)
    }

    fn and(&mut self) -> Result<bool, TestError> {
        let mut left = self.expr()?;
        while self.operator_at(self.pos) == Some(Operator::And) {
            self.pos += 1;
            let right = self.expr()?;
            left = left && right;
        }
        Ok(left)
    }

    fn expr(&mut self) -> Result<bool, TestError> {
        if self.pos >= self.tokens.len() {
            return Err(TestError::MalformedExpression);
        }

        if self.operator_at(self.pos) == Some(Operator::OpenParenthesis) {
            self.pos += 1;
            let content = self.or()?;
            if self.operator_at(self.pos) != Some(Operator::CloseParenthesis) {
                return Err(TestError::UnclosedParenthesis);
            }
            self.pos += 1;
            return Ok(content);
        }

        if self.pos + 1 >= self.tokens.len() {
            return Err(TestError::MalformedExpression);
        }

        match self.operator_at(self.pos + 1) {
            None => {
                let operand = &self.tokens[self.pos + 1];
                let result = match self.operator_at(self.pos) {
                    Some(Operator::Empty) => operand.is_empty(),
                    Some(Operator::NonEmpty) => !operand.is_empty(),
                    _ => return Err(TestError::MalformedExpression),
                };
                self.pos += 2;
                Ok(result)
            }
            Some(op) => {
                let (Some(left), Some(right)) = (self.tokens.get(self.pos), self.tokens.get(self.pos + 2)) else {
                    return Err(TestError::MalformedExpression);
                };
                let result = binary(op, left, right)?;
                self.pos += 3;
                Ok(result)
            }
        }
    }
}

fn binary(op: Operator, left: &str, right: &str) -> Result<bool, TestError> {
    let ordering = || compare(left, right);
    let result = match op {
        Operator::Equals => ordering() == Ordering::Equal,
        Operator::NotEquals => ordering() != Ordering::Equal,
        Operator::Greater => ordering() == Ordering::Greater,
        Operator::Less => ordering() == Ordering::Less,
        Operator::GreaterOrEquals => ordering() != Ordering::Less,
        Operator::LessOrEquals => ordering() != Ordering::Greater,
        Operator::Matches => {
            let pattern = Regex::new(&format!("^(?:{})$", right)).map_err(|_| TestError::MalformedRegex)?;
            pattern.is_match(left)
        }
        _ => return Err(TestError::MalformedExpression),
    };
    Ok(result)
}

/// Numeric comparison when both sides are integers, byte-wise otherwise.
fn compare(left: &str, right: &str) -> Ordering {
    if is_number(left) && is_number(right) {
        if let (Ok(l), Ok(r)) = (left.parse::<i64>(), right.parse::<i64>()) {
            return l.cmp(&r);
        }
    }
    left.cmp(right)
}

pub struct TestCommand;

impl Command for TestCommand {
    fn name(&self) -> &'static str {
        "test"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        if args.is_empty() {
            return Status::SUCCESS;
        }
        match evaluate_test(args) {
            Ok(true) => Status::SUCCESS,
            Ok(false) => TEST_FALSE,
            Err(e) => {
                session.write_err(&format!("{}\n", e));
                e.status()
            }
        }
    }
}
