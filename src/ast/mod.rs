//! Abstract Syntax Tree for shell scripts
//!
//! Architecture:
//!   Source → Lexer → Parser → AST → Interpreter → Session

pub mod types;
pub mod operator;
pub mod json;

pub use types::{Ast, CommandExprNode, Evaluable, Expandable, OperatorKind};
