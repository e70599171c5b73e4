//! Interpreter module
//!
//! This module contains the runtime: sessions, streams, word expansion and
//! tree evaluation.

pub mod errors;
pub mod evaluate;
pub mod expand;
pub mod session;
pub mod streams;

pub use errors::EvalOutcome;
pub use evaluate::evaluate;
pub use expand::{expand, expand_command, split_words};
pub use session::Session;
pub use streams::{empty_input, in_stream, input_from, out_stream, sink, write_str, CaptureBuffer, InStream, OutStream};
