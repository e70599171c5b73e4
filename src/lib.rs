//! embed-bash - An embeddable Bash-like command interpreter
//!
//! Scripts are tokenized and parsed into a tree of `Evaluable` nodes, then
//! evaluated against a `Session` whose commands come from the `Shell` it
//! was created with. Hosts extend the language by registering their own
//! `Command`s.

pub mod ast;
pub mod commands;
pub mod interpreter;
pub mod parser;
pub mod shell;
pub mod status;

pub use ast::{Evaluable, Expandable};
pub use commands::{Command, CommandRegistry};
pub use interpreter::{CaptureBuffer, EvalOutcome, Session};
pub use parser::{parse, ParseException, SyntaxErrorKind};
pub use shell::{DefaultReporter, ErrorReporter, Shell, ShellError, ShellOptions};
pub use status::{Status, MAX_DEPTH};
