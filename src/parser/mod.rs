//! Parser module for shell scripts
//!
//! This module contains the lexer, the token cursor and the parser.

pub mod types;
pub mod lexer;
pub mod cursor;
pub mod depth;
pub mod parser;

// Re-exports
pub use types::{ParseException, ParseMode, SyntaxErrorKind};
pub use lexer::{tokenize, Lexer, Token, TokenType};
pub use cursor::{Keyword, TokenCursor};
pub use parser::{parse, Parser};
