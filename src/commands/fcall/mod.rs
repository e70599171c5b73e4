// src/commands/fcall/mod.rs
use crate::commands::eval::MAX_DEPTH_MESSAGE;
use crate::commands::Command;
use crate::interpreter::{evaluate, Session};
use crate::status::Status;

pub const ERROR_PARAM_NUMBER: Status = Status::command(1);
pub const ERROR_FUNCTION_NOT_FOUND: Status = Status::command(2);

pub struct FcallCommand;

impl Command for FcallCommand {
    fn name(&self) -> &'static str {
        "fcall"
    }

    /// `fcall NAME ARGS...`: run a user function with `$0` set to its name
    /// and `$1..` to the remaining arguments.
    fn run(&self, args: &[String], session: &mut Session) -> Status {
        let Some(name) = args.first() else {
            session.write_err("fcall: takes >=1 parameters, but received 0.\n");
            return ERROR_PARAM_NUMBER;
        };
        let Some(body) = session.get_function(name) else {
            session.write_err(&format!("fcall: {}: function not found.\n", name));
            return ERROR_FUNCTION_NOT_FOUND;
        };

        if !session.increase_depth() {
            session.write_err(MAX_DEPTH_MESSAGE);
            return Status::MAX_DEPTH_REACHED;
        }
        let mut call = session.function_call(args.to_vec());
        // A stray break/continue ends the function.
        let status = evaluate(&body, &mut call)
            .status()
            .unwrap_or_else(|| call.last_status());
        session.decrease_depth();
        status
    }
}
