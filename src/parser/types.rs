//! Parser Types and Constants
//!
//! Shared types used across the tokenizer and parser: the syntax error
//! kinds, the positioned `ParseException` with its diagnostics rendering,
//! and the parse-mode flags threaded through recursive calls.

use std::fmt;
use thiserror::Error;

use crate::status::{Status, MAX_DEPTH};

/// Max nesting of parentheses, braces, substitutions and keyword blocks.
pub const MAX_PARSER_DEPTH: usize = MAX_DEPTH;

/// Max operators (`|`, `&&`, `||`) chained in one command group.
pub const MAX_OPERATOR_CHAIN: usize = 256;

/// Every way tokenizing or parsing can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    Generic,
    UnclosedSimpleQuotes,
    UnclosedDoubleQuotes,
    UnclosedBackQuotes,
    UnclosedParentheses,
    UnclosedBrackets,
    UnclosedSqrBrackets,
    UnclosedSubcommand,
    UnclosedVariable,
    InvalidVariableName,
    UnexpectedToken,
    UnexpectedEof,
    ArgOutOfRange,
    EmptyBlock,
    UnfinishedKeywordIf,
    MissingKeywordThen,
    UnfinishedKeywordLoop,
    UnfinishedKeywordFor,
    MissingKeywordIn,
    UnfinishedKeywordWhile,
    UnfinishedKeywordUntil,
    MissingKeywordDo,
    InvalidFunctionName,
    InvalidFunctionBody,
    BadEncoding,
    MaxDepthReached,
}

impl SyntaxErrorKind {
    pub fn status(self) -> Status {
        match self {
            Self::Generic => Status::SYNTAX_ERROR,
            Self::UnclosedSimpleQuotes => Status::UNCLOSED_SIMPLE_QUOTES,
            Self::UnclosedDoubleQuotes => Status::UNCLOSED_DOUBLE_QUOTES,
            Self::UnclosedBackQuotes => Status::UNCLOSED_BACK_QUOTES,
            Self::UnclosedParentheses => Status::UNCLOSED_PARENTHESES,
            Self::UnclosedBrackets => Status::UNCLOSED_BRACKETS,
            Self::UnclosedSqrBrackets => Status::UNCLOSED_SQR_BRACKETS,
            Self::UnclosedSubcommand => Status::UNCLOSED_SUBCOMMAND,
            Self::UnclosedVariable => Status::UNCLOSED_VARIABLE,
            Self::InvalidVariableName => Status::INVALID_VARIABLE_NAME,
            Self::UnexpectedToken => Status::UNEXPECTED_TOKEN,
            Self::UnexpectedEof => Status::UNEXPECTED_EOF,
            Self::ArgOutOfRange => Status::ARG_OUT_OF_RANGE,
            Self::EmptyBlock => Status::EMPTY_BLOCK,
            Self::UnfinishedKeywordIf => Status::UNFINISHED_KEYWORD_IF,
            Self::MissingKeywordThen => Status::MISSING_KEYWORD_THEN,
            Self::UnfinishedKeywordLoop => Status::UNFINISHED_KEYWORD_LOOP,
            Self::UnfinishedKeywordFor => Status::UNFINISHED_KEYWORD_FOR,
            Self::MissingKeywordIn => Status::MISSING_KEYWORD_IN,
            Self::UnfinishedKeywordWhile => Status::UNFINISHED_KEYWORD_WHILE,
            Self::UnfinishedKeywordUntil => Status::UNFINISHED_KEYWORD_UNTIL,
            Self::MissingKeywordDo => Status::MISSING_KEYWORD_DO,
            Self::InvalidFunctionName => Status::INVALID_FUNCTION_NAME,
            Self::InvalidFunctionBody => Status::INVALID_FUNCTION_BODY,
            Self::BadEncoding => Status::BAD_ENCODING,
            Self::MaxDepthReached => Status::MAX_DEPTH_REACHED,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "Syntax error in command",
            Self::UnclosedSimpleQuotes => "Unclosed simple quotes",
            Self::UnclosedDoubleQuotes => "Unclosed double quotes",
            Self::UnclosedBackQuotes => "Unclosed back quotes",
            Self::UnclosedParentheses => "Unclosed parentheses",
            Self::UnclosedBrackets => "Unclosed brackets",
            Self::UnclosedSqrBrackets => "Unclosed square brackets",
            Self::UnclosedSubcommand => "Unclosed subcommand",
            Self::UnclosedVariable => "Unclosed variable",
            Self::InvalidVariableName => "Invalid variable name",
            Self::UnexpectedToken => "Unexpected token",
            Self::UnexpectedEof => "Unexpected end of file",
            Self::ArgOutOfRange => "Argument out of range",
            Self::EmptyBlock => "Empty block",
            Self::UnfinishedKeywordIf => "Syntax error: 'if' keyword is not finished.",
            Self::MissingKeywordThen => "Syntax error: 'then' keyword is missing.",
            Self::UnfinishedKeywordLoop => "Syntax error: 'loop' keyword is not finished.",
            Self::UnfinishedKeywordFor => "Syntax error: 'for' keyword is not finished.",
            Self::MissingKeywordIn => "Syntax error: 'in' keyword is missing.",
            Self::UnfinishedKeywordWhile => "Syntax error: 'while' keyword is not finished.",
            Self::UnfinishedKeywordUntil => "Syntax error: 'until' keyword is not finished.",
            Self::MissingKeywordDo => "Syntax error: 'do' keyword is missing.",
            Self::InvalidFunctionName => "Invalid function name",
            Self::InvalidFunctionBody => "Invalid function body",
            Self::BadEncoding => "Bad encoding",
            Self::MaxDepthReached => "Maximum command nesting depth reached",
        }
    }
}

/// A positioned syntax error. The rendered diagnostics are computed once,
/// when the error is raised, while the source text is at hand.
#[derive(Debug, Clone, Error)]
pub struct ParseException {
    pub kind: SyntaxErrorKind,
    /// Byte offset of the offending token or construct.
    pub pos: usize,
    pub message: String,
}

impl fmt::Display for ParseException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl ParseException {
    pub fn new(kind: SyntaxErrorKind, source: &str, pos: usize) -> Self {
        Self {
            kind,
            pos,
            message: render_diagnostics(kind, source, pos),
        }
    }

    pub fn status(&self) -> Status {
        self.kind.status()
    }
}

/// Builds `<kind>\n<line>\n<caret>\nCode point: N\nByte: N\n`.
pub fn render_diagnostics(kind: SyntaxErrorKind, source: &str, pos: usize) -> String {
    let (line, column, code_point) = match line_at(source, pos) {
        Some((start, line)) => (
            line,
            code_point_index(line, pos - start),
            code_point_index(source, pos),
        ),
        None => ("", pos, pos),
    };
    format!(
        "{}\n{}\n{}^~~~\nCode point: {}\nByte: {}\n",
        kind.as_str(),
        line,
        " ".repeat(column),
        code_point,
        pos
    )
}

/// The line containing byte `pos`, with the byte offset where it starts.
fn line_at(source: &str, pos: usize) -> Option<(usize, &str)> {
    if pos >= source.len() {
        return None;
    }
    let bytes = source.as_bytes();
    let start = bytes[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| pos + i)
        .unwrap_or(source.len());
    source.get(start..end).map(|line| (start, line))
}

/// Index of the UTF-8 scalar that contains byte `pos`.
fn code_point_index(text: &str, pos: usize) -> usize {
    text.char_indices()
        .take_while(|(offset, _)| *offset <= pos)
        .count()
        .saturating_sub(1)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_var_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b == b'_' || b.is_ascii_alphabetic())
        && bytes.all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

/// A positional argument index: digits, not starting with `0`.
pub fn is_arg_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b'1'..=b'9')) && bytes.all(|b| b.is_ascii_digit())
}

/// Optional sign followed by decimal digits.
pub fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse-mode flags threaded through recursive parser calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMode(u8);

impl ParseMode {
    pub const NORMAL: ParseMode = ParseMode(0);
    /// A backtick closes the current command instead of opening one.
    pub const BACKQUOTE: ParseMode = ParseMode(1);
    /// Directly inside a loop body: `break` and `continue` are legal.
    pub const LOOP: ParseMode = ParseMode(1 << 1);
    /// Parsing a function name: `{` ends the expression.
    pub const FUNCTION_NAME: ParseMode = ParseMode(1 << 2);

    pub fn has(self, flag: ParseMode) -> bool {
        self.0 & flag.0 == flag.0 && flag.0 != 0
    }

    pub fn with(self, flag: ParseMode) -> ParseMode {
        ParseMode(self.0 | flag.0)
    }

    pub fn without(self, flag: ParseMode) -> ParseMode {
        ParseMode(self.0 & !flag.0)
    }

    /// Only the loop flag survives into nested statement lists.
    pub fn nested(self) -> ParseMode {
        ParseMode(self.0 & Self::LOOP.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_single_line() {
        let err = ParseException::new(SyntaxErrorKind::UnexpectedToken, "echo )", 5);
        assert_eq!(
            err.to_string(),
            "Unexpected token\necho )\n     ^~~~\nCode point: 5\nByte: 5\n"
        );
        assert_eq!(err.status(), Status::UNEXPECTED_TOKEN);
    }

    #[test]
    fn test_diagnostics_caret_is_relative_to_line() {
        let err = ParseException::new(SyntaxErrorKind::UnclosedSimpleQuotes, "echo a\necho 'b", 12);
        assert_eq!(
            err.to_string(),
            "Unclosed simple quotes\necho 'b\n     ^~~~\nCode point: 12\nByte: 12\n"
        );
    }

    #[test]
    fn test_diagnostics_counts_code_points() {
        // "é" is two bytes, so byte 8 is code point 7.
        let err = ParseException::new(SyntaxErrorKind::BadEncoding, "echo é \\xZZ", 8);
        assert!(err.to_string().starts_with("Bad encoding\necho é \\xZZ\n       ^~~~\n"));
        assert!(err.to_string().ends_with("Code point: 7\nByte: 8\n"));
    }

    #[test]
    fn test_diagnostics_out_of_range() {
        let err = ParseException::new(SyntaxErrorKind::Generic, "ab", 4);
        assert_eq!(
            err.to_string(),
            "Syntax error in command\n\n    ^~~~\nCode point: 4\nByte: 4\n"
        );
    }

    #[test]
    fn test_name_predicates() {
        assert!(is_var_name("_a1"));
        assert!(is_var_name("Name"));
        assert!(!is_var_name("1a"));
        assert!(!is_var_name(""));
        assert!(!is_var_name("a-b"));
        assert!(is_arg_name("12"));
        assert!(!is_arg_name("0"));
        assert!(!is_arg_name("1a"));
        assert!(is_number("-0007"));
        assert!(is_number("+3"));
        assert!(!is_number("-"));
        assert!(!is_number("3.5"));
    }

    #[test]
    fn test_parse_mode_flags() {
        let mode = ParseMode::NORMAL.with(ParseMode::LOOP).with(ParseMode::BACKQUOTE);
        assert!(mode.has(ParseMode::LOOP));
        assert!(mode.has(ParseMode::BACKQUOTE));
        assert!(!mode.has(ParseMode::FUNCTION_NAME));
        assert!(!ParseMode::NORMAL.has(ParseMode::NORMAL));
        assert_eq!(mode.nested(), ParseMode::LOOP);
        assert!(!mode.without(ParseMode::LOOP).has(ParseMode::LOOP));
    }
}
