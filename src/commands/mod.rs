// src/commands/mod.rs
pub mod echo;
pub mod env;
pub mod eval;
pub mod fcall;
pub mod math;
pub mod registry;
pub mod seq;
pub mod test_cmd;
pub mod types;
pub mod var;

pub use registry::{register_builtins, CommandRegistry};
pub use types::Command;
