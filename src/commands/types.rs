// src/commands/types.rs
use crate::interpreter::Session;
use crate::status::Status;

/// A command callable by name from scripts.
///
/// `args` excludes the command name itself. Output goes through the
/// session's streams; the returned status becomes `$?`.
pub trait Command {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], session: &mut Session) -> Status;
}
