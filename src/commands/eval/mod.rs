// src/commands/eval/mod.rs
use crate::commands::Command;
use crate::interpreter::Session;
use crate::shell::Shell;
use crate::status::Status;

pub struct EvalCommand;

pub(crate) const MAX_DEPTH_MESSAGE: &str = "Maximum shell depth reached.\n";

impl Command for EvalCommand {
    fn name(&self) -> &'static str {
        "eval"
    }

    /// Run the arguments, joined by single spaces, as a script in the
    /// current session.
    fn run(&self, args: &[String], session: &mut Session) -> Status {
        let source = args.join(" ");

        if !session.increase_depth() {
            session.write_err(MAX_DEPTH_MESSAGE);
            return Status::MAX_DEPTH_REACHED;
        }
        let status = Shell::run(&source, session);
        session.decrease_depth();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{empty_input, CaptureBuffer};
    use crate::shell::ShellOptions;
    use std::rc::Rc;

    fn session(shell: Shell) -> (Session, CaptureBuffer, CaptureBuffer) {
        let out = CaptureBuffer::new();
        let err = CaptureBuffer::new();
        let session = Session::new(Rc::new(shell), empty_input(), out.stream(), err.stream());
        (session, out, err)
    }

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_eval_joins_arguments() {
        let (mut s, out, _) = session(Shell::with_defaults());
        let status = EvalCommand.run(&args(&["echo", "-n", "a;", "echo", "-n", "b"]), &mut s);
        assert_eq!(status, Status::SUCCESS);
        assert_eq!(out.contents(), "ab");
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn test_eval_shares_session() {
        let (mut s, _, _) = session(Shell::with_defaults());
        EvalCommand.run(&args(&["setvar", "x", "1"]), &mut s);
        assert_eq!(s.get_var("x"), "1");
    }

    #[test]
    fn test_eval_reports_syntax_errors() {
        let (mut s, _, err) = session(Shell::with_defaults());
        let status = EvalCommand.run(&args(&["echo", "'open"]), &mut s);
        assert_eq!(status, Status::UNCLOSED_SIMPLE_QUOTES);
        assert!(err.contents().starts_with("Unclosed simple quotes\n"));
    }

    #[test]
    fn test_eval_depth_bound() {
        let shell = Shell::with_defaults().with_options(ShellOptions { max_depth: 0, ..Default::default() });
        let (mut s, out, err) = session(shell);
        let status = EvalCommand.run(&args(&["echo", "x"]), &mut s);
        assert_eq!(status, Status::MAX_DEPTH_REACHED);
        assert_eq!(out.contents(), "");
        assert_eq!(err.contents(), MAX_DEPTH_MESSAGE);
    }
}
