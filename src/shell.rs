//! Shell
//!
//! The embedding boundary. A `Shell` owns the command registry, the
//! run-time options and the error hook; it is built once, wrapped in an
//! `Rc` and shared by every session created from it. Scripts are run
//! against a session with [`Shell::run`] and its variants.

use std::io::Read;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::commands::{register_builtins, Command, CommandRegistry};
use crate::interpreter::{evaluate, Session};
use crate::parser::types::SyntaxErrorKind;
use crate::parser::ParseException;
use crate::status::{Status, MAX_DEPTH};

pub use crate::parser::parse;

/// Run-time options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Bound on nested `eval` and function calls.
    pub max_depth: usize,
    /// Stop a block at the first command that is not found.
    pub stop_on_command_not_found: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            stop_on_command_not_found: false,
        }
    }
}

/// Host hook for interpreter-level errors. The default methods write the
/// standard messages to the session's err stream.
pub trait ErrorReporter {
    fn command_not_found(&self, session: &Session, name: &str) {
        session.write_err(&format!("shell: \u{201C}{}\u{201D}: not found.\n", name));
    }

    fn invalid_function_name(&self, session: &Session, name: &str) {
        session.write_err(&format!("shell: \u{201C}{}\u{201D}: invalid function name.\n", name));
    }

    fn syntax_error(&self, session: &Session, error: &ParseException) {
        session.write_err(&error.to_string());
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultReporter;

impl ErrorReporter for DefaultReporter {}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}")]
    Parse(#[from] ParseException),
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    pub fn status(&self) -> Status {
        match self {
            Self::Parse(e) => e.status(),
            Self::Io(_) => Status::ERROR,
        }
    }
}

pub struct Shell {
    registry: CommandRegistry,
    options: ShellOptions,
    reporter: Box<dyn ErrorReporter>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// A shell with no commands registered.
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
            options: ShellOptions::default(),
            reporter: Box::new(DefaultReporter),
        }
    }

    /// A shell with every built-in command registered.
    pub fn with_defaults() -> Self {
        let mut shell = Self::new();
        register_builtins(&mut shell.registry);
        shell
    }

    pub fn with_options(mut self, options: ShellOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    pub fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    // =========================================================================
    // REGISTRY
    // =========================================================================

    pub fn register(&mut self, command: impl Command + 'static) {
        self.registry.register(Box::new(command));
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Command>> {
        self.registry.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.registry.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.registry.names()
    }

    // =========================================================================
    // ENTRY POINTS
    // =========================================================================

    /// Parse and evaluate `source` in `session`, using the session's shell.
    /// Syntax errors go to the shell's error hook and their status is
    /// returned.
    pub fn run(source: &str, session: &mut Session) -> Status {
        match Self::try_run(source, session) {
            Ok(status) => status,
            Err(e) => {
                if let ShellError::Parse(ref exception) = e {
                    let shell = Rc::clone(session.shell());
                    shell.reporter().syntax_error(session, exception);
                }
                let status = e.status();
                session.set_last_status(status);
                status
            }
        }
    }

    /// Read a whole script from `reader` and run it.
    pub fn run_reader<R: Read>(mut reader: R, session: &mut Session) -> Status {
        let mut bytes = Vec::new();
        if let Err(e) = reader.read_to_end(&mut bytes) {
            session.write_err(&format!("shell: {}\n", ShellError::Io(e)));
            session.set_last_status(Status::ERROR);
            return Status::ERROR;
        }
        match String::from_utf8(bytes) {
            Ok(source) => Self::run(&source, session),
            Err(e) => {
                let valid = e.utf8_error().valid_up_to();
                let source = String::from_utf8_lossy(e.as_bytes());
                let exception = ParseException::new(SyntaxErrorKind::BadEncoding, &source, valid);
                let shell = Rc::clone(session.shell());
                shell.reporter().syntax_error(session, &exception);
                session.set_last_status(exception.status());
                exception.status()
            }
        }
    }

    /// Like [`Shell::run`] but hands syntax errors back to the caller
    /// instead of reporting them.
    pub fn try_run(source: &str, session: &mut Session) -> Result<Status, ShellError> {
        debug!(source, depth = session.depth(), "run");
        let tree = parse(source)?;
        let status = evaluate(&tree, session)
            .status()
            .unwrap_or_else(|| session.last_status());
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::{empty_input, CaptureBuffer};
    use std::cell::RefCell;

    fn session(shell: Shell) -> (Session, CaptureBuffer, CaptureBuffer) {
        let out = CaptureBuffer::new();
        let err = CaptureBuffer::new();
        let session = Session::new(Rc::new(shell), empty_input(), out.stream(), err.stream());
        (session, out, err)
    }

    struct Hello;

    impl Command for Hello {
        fn name(&self) -> &'static str {
            "hello"
        }

        fn run(&self, args: &[String], session: &mut Session) -> Status {
            session.write_out(&format!("hello {}", args.join(",")));
            Status::SUCCESS
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl ErrorReporter for Recorder {
        fn command_not_found(&self, _session: &Session, name: &str) {
            self.seen.borrow_mut().push(format!("missing {name}"));
        }

        fn syntax_error(&self, _session: &Session, error: &ParseException) {
            self.seen.borrow_mut().push(format!("syntax {}", error.status()));
        }
    }

    #[test]
    fn test_new_shell_is_empty() {
        let shell = Shell::new();
        assert!(shell.names().is_empty());
        assert_eq!(shell.options().max_depth, MAX_DEPTH);
        assert!(!shell.options().stop_on_command_not_found);
    }

    #[test]
    fn test_with_defaults_registers_builtins() {
        let shell = Shell::with_defaults();
        for name in ["echo", "eval", "fcall", "getenv", "getvar", "math", "seq", "setenv", "setvar", "test"] {
            assert!(shell.contains(name), "{name}");
        }
    }

    #[test]
    fn test_host_commands() {
        let mut shell = Shell::new();
        shell.register(Hello);
        let (mut s, out, _) = session(shell);
        assert_eq!(Shell::run("hello a b", &mut s), Status::SUCCESS);
        assert_eq!(out.contents(), "hello a,b");
    }

    #[test]
    fn test_remove_command() {
        let mut shell = Shell::with_defaults();
        assert!(shell.remove("echo").is_some());
        assert!(!shell.contains("echo"));
        let (mut s, _, err) = session(shell);
        assert_eq!(Shell::run("echo x", &mut s), Status::COMMAND_NOT_FOUND);
        assert!(err.contents().contains("not found"));
    }

    #[test]
    fn test_run_reports_syntax_errors() {
        let (mut s, out, err) = session(Shell::with_defaults());
        assert_eq!(Shell::run("echo \"open", &mut s), Status::UNCLOSED_DOUBLE_QUOTES);
        assert_eq!(out.contents(), "");
        assert!(err.contents().starts_with("Unclosed double quotes\n"));
        assert_eq!(s.last_status(), Status::UNCLOSED_DOUBLE_QUOTES);
    }

    #[test]
    fn test_try_run_returns_the_exception() {
        let (mut s, _, err) = session(Shell::with_defaults());
        let result = Shell::try_run("if a", &mut s);
        assert!(matches!(result, Err(ShellError::Parse(_))));
        assert_eq!(err.contents(), "");
        assert_eq!(Shell::try_run("echo -n ok", &mut s).unwrap(), Status::SUCCESS);
    }

    #[test]
    fn test_custom_reporter() {
        let reporter = Recorder::default();
        let seen = Rc::clone(&reporter.seen);
        let (mut s, _, err) = session(Shell::with_defaults().with_reporter(reporter));
        Shell::run("nope", &mut s);
        Shell::run("'", &mut s);
        assert_eq!(*seen.borrow(), vec!["missing nope".to_string(), "syntax 3".to_string()]);
        assert_eq!(err.contents(), "");
    }

    #[test]
    fn test_run_reader() {
        let (mut s, out, _) = session(Shell::with_defaults());
        let status = Shell::run_reader("echo -n from reader".as_bytes(), &mut s);
        assert_eq!(status, Status::SUCCESS);
        assert_eq!(out.contents(), "from reader");
    }

    #[test]
    fn test_run_reader_rejects_invalid_utf8() {
        let (mut s, _, err) = session(Shell::with_defaults());
        let status = Shell::run_reader(&b"echo \xff"[..], &mut s);
        assert_eq!(status, Status::BAD_ENCODING);
        assert!(err.contents().starts_with("Bad encoding\n"));
    }
}
