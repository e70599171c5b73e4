// src/commands/var/mod.rs
use crate::commands::env::{get, set, Namespace};
use crate::commands::Command;
use crate::interpreter::Session;
use crate::status::Status;

pub struct GetvarCommand;

impl Command for GetvarCommand {
    fn name(&self) -> &'static str {
        "getvar"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        get(self.name(), Namespace::Local, args, session)
    }
}

pub struct SetvarCommand;

impl Command for SetvarCommand {
    fn name(&self) -> &'static str {
        "setvar"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        set(self.name(), Namespace::Local, args, session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::env::{ERROR_PARAM_NUMBER, ERROR_VARIABLE_NAME};
    use crate::interpreter::{empty_input, CaptureBuffer};
    use crate::shell::Shell;
    use std::rc::Rc;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_setvar_then_getvar() {
        let out = CaptureBuffer::new();
        let err = CaptureBuffer::new();
        let mut s = Session::new(Rc::new(Shell::new()), empty_input(), out.stream(), err.stream());
        assert_eq!(SetvarCommand.run(&args(&["variable", "value"]), &mut s), Status::SUCCESS);
        assert_eq!(s.get_var("variable"), "value");
        assert!(!s.has_env("variable"));
        assert_eq!(GetvarCommand.run(&args(&["variable"]), &mut s), Status::SUCCESS);
        assert_eq!(out.contents(), "value");

        assert_eq!(GetvarCommand.run(&args(&["1234"]), &mut s), ERROR_VARIABLE_NAME);
        assert_eq!(SetvarCommand.run(&args(&["a", "b", "c"]), &mut s), ERROR_PARAM_NUMBER);
        assert_eq!(err.contents(), "getvar: \u{201C}1234\u{201D}: not a variable name.\nsetvar: takes 2 parameters, but received 3.\n");
    }
}
