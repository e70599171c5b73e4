// src/commands/math/mod.rs
use std::collections::HashMap;

use thiserror::Error;

use crate::commands::Command;
use crate::interpreter::Session;
use crate::parser::types::{is_number, is_var_name};
use crate::status::Status;

/// Nesting bound of a math expression.
const MAX_MATH_DEPTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("math: value is not an integer.")]
    NotAnInteger,
    #[error("math: arithmetic overflow.")]
    Overflow,
    #[error("math: arithmetic underflow.")]
    Underflow,
    #[error("math: division by zero.")]
    DivisionByZero,
    #[error("math: undefined expression 0^0.")]
    ZeroPowZero,
    #[error("math: factorial of a negative number.")]
    FactorialNegative,
    #[error("math: malformed expression.")]
    MalformedExpression,
    #[error("math: expression nesting too deep.")]
    MaxDepthReached,
    #[error("math: invalid variable name.")]
    InvalidVariableName,
    #[error("math: invalid sequence iteration logic.")]
    SequenceIteration,
}

impl MathError {
    pub fn status(self) -> Status {
        let n = match self {
            Self::NotAnInteger => 1,
            Self::Overflow => 2,
            Self::Underflow => 3,
            Self::DivisionByZero => 4,
            Self::ZeroPowZero => 5,
            Self::FactorialNegative => 6,
            Self::MalformedExpression => 7,
            Self::MaxDepthReached => 8,
            Self::InvalidVariableName => 9,
            Self::SequenceIteration => 10,
        };
        Status::command(n)
    }

    /// Overflow or underflow depending on the sign the exact result would
    /// have had.
    fn out_of_range(negative: bool) -> Self {
        if negative {
            Self::Underflow
        } else {
            Self::Overflow
        }
    }
}

type MathResult = Result<i64, MathError>;
type Bindings = HashMap<String, i64>;

// ============================================================================
// CHECKED ARITHMETIC
// ============================================================================

fn add(a: i64, b: i64) -> MathResult {
    a.checked_add(b).ok_or(MathError::out_of_range(b < 0))
}

fn subtract(a: i64, b: i64) -> MathResult {
    a.checked_sub(b).ok_or(MathError::out_of_range(b > 0))
}

fn multiply(a: i64, b: i64) -> MathResult {
    a.checked_mul(b).ok_or(MathError::out_of_range((a < 0) != (b < 0)))
}

fn divide(a: i64, b: i64) -> MathResult {
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    a.checked_div(b).ok_or(MathError::Overflow)
}

fn modulo(a: i64, b: i64) -> MathResult {
    if b == 0 {
        return Err(MathError::DivisionByZero);
    }
    // i64::MIN % -1 is 0 but overflows in checked_rem
    Ok(a.checked_rem(b).unwrap_or(0))
}

fn negate(a: i64) -> MathResult {
    a.checked_neg().ok_or(MathError::Overflow)
}

fn power(base: i64, exponent: i64) -> MathResult {
    if base == 0 && exponent == 0 {
        return Err(MathError::ZeroPowZero);
    }
    match base {
        0 => return Ok(0),
        1 => return Ok(1),
        -1 => return Ok(if exponent % 2 == 0 { 1 } else { -1 }),
        _ => {}
    }
    if exponent < 0 {
        return Ok(0);
    }
    let negative = base < 0 && exponent % 2 == 1;
    u32::try_from(exponent)
        .ok()
        .and_then(|e| base.checked_pow(e))
        .ok_or(MathError::out_of_range(negative))
}

fn factorial(n: i64) -> MathResult {
    if n < 0 {
        return Err(MathError::FactorialNegative);
    }
    (2..=n).try_fold(1i64, |acc, i| acc.checked_mul(i).ok_or(MathError::Overflow))
}

fn sign(n: i64) -> i64 {
    n.signum()
}

// ============================================================================
// PARSER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Power,
    Factorial,
    Sign,
    Abs,
    Sum,
    Product,
    Separator,
    OpenParenthesis,
    CloseParenthesis,
}

fn token(text: &str) -> Option<Token> {
    let token = match text {
        "+" => Token::Plus,
        "-" => Token::Minus,
        "*" | "\u{00D7}" => Token::Multiply,
        "/" | "\u{00F7}" => Token::Divide,
        "%" => Token::Modulo,
        "^" | "**" => Token::Power,
        "factorial" => Token::Factorial,
        "sign" => Token::Sign,
        "abs" => Token::Abs,
        "sum" => Token::Sum,
        "product" => Token::Product,
        "," => Token::Separator,
        "(" => Token::OpenParenthesis,
        ")" => Token::CloseParenthesis,
        _ => return None,
    };
    Some(token)
}

/// Evaluate an integer expression given as separate tokens.
///
/// ```text
/// sum    := mult (("+" | "-") mult)*
/// mult   := pow (("*" | "/" | "%") pow)*
/// pow    := expr (("^" | "**") expr)*
/// expr   := ["+" | "-"] ( "(" sum ")" | ("factorial" | "sign" | "abs") sum
///                       | ("sum" | "product") "(" var "," sum "," sum "," sum "," sum ")"
///                       | integer | var )
/// ```
pub fn evaluate_math(tokens: &[String]) -> MathResult {
    let mut parser = MathParser { tokens, depth: 0 };
    let mut pos = 0;
    let result = parser.toplevel(&mut pos, &Bindings::new())?;
    if pos < tokens.len() {
        return Err(MathError::MalformedExpression);
    }
    Ok(result)
}

struct MathParser<'a> {
    tokens: &'a [String],
    depth: usize,
}

impl<'a> MathParser<'a> {
    fn token_at(&self, pos: usize) -> Option<Token> {
        self.tokens.get(pos).and_then(|t| token(t))
    }

    fn expect(&self, pos: &mut usize, expected: Token) -> Result<(), MathError> {
        if self.token_at(*pos) != Some(expected) {
            return Err(MathError::MalformedExpression);
        }
        *pos += 1;
        Ok(())
    }

    fn toplevel(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        if self.depth >= MAX_MATH_DEPTH {
            return Err(MathError::MaxDepthReached);
        }
        self.depth += 1;
        let result = self.sum(pos, vars);
        self.depth -= 1;
        result
    }

    fn sum(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        let mut left = self.mult(pos, vars)?;
        loop {
            match self.token_at(*pos) {
                Some(Token::Plus) => {
                    *pos += 1;
                    let right = self.mult(pos, vars)?;
                    left = add(left, right)?;
                }
                Some(Token::Minus) => {
                    *pos += 1;
                    let right = self.mult(pos, vars)?;
                    left = subtract(left, right)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn mult(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        let mut left = self.pow(pos, vars)?;
        loop {
            let op: fn(i64, i64) -> MathResult = match self.token_at(*pos) {
                Some(Token::Multiply) => multiply,
                Some(Token::Divide) => divide,
                Some(Token::Modulo) => modulo,
                _ => return Ok(left),
            };
            *pos += 1;
            let right = self.pow(pos, vars)?;
            left = op(left, right)?;
        }
    }

    fn pow(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        let mut left = self.expr(pos, vars)?;
        while self.token_at(*pos) == Some(Token::Power) {
            *pos += 1;
            let right = self.expr(pos, vars)?;
            left = power(left, right)?;
        }
        Ok(left)
    }

    fn expr(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        let negative = match self.token_at(*pos) {
            Some(Token::Plus) => {
                *pos += 1;
                false
            }
            Some(Token::Minus) => {
                *pos += 1;
                true
            }
            _ => false,
        };

        let value = match self.token_at(*pos) {
            Some(Token::OpenParenthesis) => {
                *pos += 1;
                let content = self.toplevel(pos, vars)?;
                self.expect(pos, Token::CloseParenthesis)?;
                content
            }
            Some(Token::Factorial) => {
                *pos += 1;
                factorial(self.toplevel(pos, vars)?)?
            }
            Some(Token::Sign) => {
                *pos += 1;
                sign(self.toplevel(pos, vars)?)
            }
            Some(Token::Abs) => {
                *pos += 1;
                self.toplevel(pos, vars)?.checked_abs().ok_or(MathError::Overflow)?
            }
            Some(Token::Sum) => {
                *pos += 1;
                self.iterate(pos, vars, 0, add)?
            }
            Some(Token::Product) => {
                *pos += 1;
                self.iterate(pos, vars, 1, multiply)?
            }
            Some(_) => return Err(MathError::MalformedExpression),
            None => self.value(pos, vars)?,
        };

        if negative {
            negate(value)
        } else {
            Ok(value)
        }
    }

    fn value(&mut self, pos: &mut usize, vars: &Bindings) -> MathResult {
        let Some(text) = self.tokens.get(*pos) else {
            return Err(MathError::MalformedExpression);
        };
        if let Some(value) = vars.get(text.as_str()) {
            *pos += 1;
            return Ok(*value);
        }
        if !is_number(text) {
            return Err(MathError::NotAnInteger);
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| MathError::out_of_range(text.starts_with('-')))?;
        *pos += 1;
        Ok(value)
    }

    /// `( var , start , step , end , body )`: fold `body` over the range with
    /// `var` bound to each value.
    fn iterate(
        &mut self,
        pos: &mut usize,
        vars: &Bindings,
        identity: i64,
        combine: fn(i64, i64) -> MathResult,
    ) -> MathResult {
        self.expect(pos, Token::OpenParenthesis)?;
        let name = self.tokens.get(*pos).ok_or(MathError::MalformedExpression)?;
        if !is_var_name(name) {
            return Err(MathError::InvalidVariableName);
        }
        *pos += 1;
        self.expect(pos, Token::Separator)?;
        let start = self.toplevel(pos, vars)?;
        self.expect(pos, Token::Separator)?;
        let step = self.toplevel(pos, vars)?;
        self.expect(pos, Token::Separator)?;
        let end = self.toplevel(pos, vars)?;
        self.expect(pos, Token::Separator)?;

        if step == 0 || (end > start && step < 0) || (end < start && step > 0) {
            return Err(MathError::SequenceIteration);
        }

        let mut scope = vars.clone();
        let body = *pos;
        let mut accumulator = identity;
        let mut current = start;
        loop {
            scope.insert(name.clone(), current);
            let mut cursor = body;
            accumulator = combine(accumulator, self.toplevel(&mut cursor, &scope)?)?;
            *pos = cursor;

            let Some(next) = current.checked_add(step) else { break };
            if (step > 0 && next > end) || (step < 0 && next < end) {
                break;
            }
            current = next;
        }

        self.expect(pos, Token::CloseParenthesis)?;
        Ok(accumulator)
    }
}

pub struct MathCommand;

impl Command for MathCommand {
    fn name(&self) -> &'static str {
        "math"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        match evaluate_math(args) {
            Ok(value) => {
                session.write_out(&value.to_string());
                Status::SUCCESS
            }
            Err(e) => {
                session.write_err(&format!("{}\n", e));
                e.status()
            }
        }
    }
}
