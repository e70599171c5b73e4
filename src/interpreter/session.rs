//! Runtime Session
//!
//! A session is the mutable state a program runs against: environment,
//! local variables, positional arguments, user functions, the three
//! standard streams, the last status and the run-time nesting depth.
//!
//! Nested execution contexts derive a new session from their parent. Each
//! derivation decides per table whether the child shares the parent's
//! table, gets a snapshot copy or starts empty:
//!
//! | derivation    | env   | locals | args  | functions | streams        |
//! |---------------|-------|--------|-------|-----------|----------------|
//! | subshell      | copy  | copy   | share | copy      | new in/out/err |
//! | function call | share | fresh  | new   | share     | unchanged      |
//! | pipe left     | share | share  | share | share     | out replaced   |
//! | pipe right    | share | share  | share | share     | in replaced    |

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::ast::Evaluable;
use crate::interpreter::streams::{write_str, InStream, OutStream};
use crate::shell::Shell;
use crate::status::Status;

pub type VarTable = Rc<RefCell<HashMap<String, String>>>;
pub type FunctionTable = Rc<RefCell<HashMap<String, Rc<Evaluable>>>>;

fn copy_table<V: Clone>(table: &Rc<RefCell<HashMap<String, V>>>) -> Rc<RefCell<HashMap<String, V>>> {
    Rc::new(RefCell::new(table.borrow().clone()))
}

pub struct Session {
    shell: Rc<Shell>,
    env: VarTable,
    vars: VarTable,
    args: Rc<Vec<String>>,
    functions: FunctionTable,
    input: InStream,
    output: OutStream,
    error: OutStream,
    last_status: Status,
    depth: usize,
}

impl Session {
    /// A top-level session with empty tables and no arguments.
    pub fn new(shell: Rc<Shell>, input: InStream, output: OutStream, error: OutStream) -> Self {
        Self {
            shell,
            env: VarTable::default(),
            vars: VarTable::default(),
            args: Rc::new(Vec::new()),
            functions: FunctionTable::default(),
            input,
            output,
            error,
            last_status: Status::SUCCESS,
            depth: 0,
        }
    }

    /// Replace the positional arguments. `args[0]` is the `$0` slot.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = Rc::new(args);
        self
    }

    /// Seed the environment.
    pub fn with_env<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .borrow_mut()
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn derive(&self) -> Self {
        Self {
            shell: Rc::clone(&self.shell),
            env: Rc::clone(&self.env),
            vars: Rc::clone(&self.vars),
            args: Rc::clone(&self.args),
            functions: Rc::clone(&self.functions),
            input: Rc::clone(&self.input),
            output: Rc::clone(&self.output),
            error: Rc::clone(&self.error),
            last_status: self.last_status,
            depth: self.depth,
        }
    }

    // =========================================================================
    // DERIVATIONS
    // =========================================================================

    /// Isolated copy for `( ... )` and command substitution. Assignments
    /// and function definitions made in the child never reach the parent.
    pub fn subshell(&self, input: InStream, output: OutStream, error: OutStream) -> Self {
        debug!(depth = self.depth, "derive subshell session");
        Self {
            env: copy_table(&self.env),
            vars: copy_table(&self.vars),
            functions: copy_table(&self.functions),
            input,
            output,
            error,
            ..self.derive()
        }
    }

    /// Session for a user function body: fresh locals, new arguments, and
    /// the caller's environment and function table.
    pub fn function_call(&self, args: Vec<String>) -> Self {
        debug!(function = args.first().map(String::as_str).unwrap_or(""), "derive function call session");
        Self {
            vars: VarTable::default(),
            args: Rc::new(args),
            last_status: Status::SUCCESS,
            ..self.derive()
        }
    }

    /// Left side of a pipe: everything shared, stdout redirected.
    pub fn pipe_left(&self, output: OutStream) -> Self {
        Self { output, ..self.derive() }
    }

    /// Right side of a pipe: everything shared, stdin redirected.
    pub fn pipe_right(&self, input: InStream) -> Self {
        Self { input, ..self.derive() }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn shell(&self) -> &Rc<Shell> {
        &self.shell
    }

    pub fn has_env(&self, name: &str) -> bool {
        self.env.borrow().contains_key(name)
    }

    /// Environment value, or `""` when unset.
    pub fn get_env(&self, name: &str) -> String {
        self.env.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn set_env(&self, name: impl Into<String>, value: impl Into<String>) {
        self.env.borrow_mut().insert(name.into(), value.into());
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }

    /// Local variable value, or `""` when unset.
    pub fn get_var(&self, name: &str) -> String {
        self.vars.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn set_var(&self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.borrow_mut().insert(name.into(), value.into());
    }

    /// `$name` lookup: locals first, then the environment.
    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.env.borrow().get(name).cloned()
    }

    /// Positional argument, or `""` past the end.
    pub fn arg(&self, index: usize) -> String {
        self.args.get(index).cloned().unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn input(&self) -> &InStream {
        &self.input
    }

    pub fn output(&self) -> &OutStream {
        &self.output
    }

    pub fn error(&self) -> &OutStream {
        &self.error
    }

    pub fn write_out(&self, text: &str) {
        write_str(&self.output, text);
    }

    pub fn write_err(&self, text: &str) {
        write_str(&self.error, text);
    }

    pub fn last_status(&self) -> Status {
        self.last_status
    }

    pub fn set_last_status(&mut self, status: Status) {
        self.last_status = status;
    }

    pub fn get_function(&self, name: &str) -> Option<Rc<Evaluable>> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn set_function(&self, name: impl Into<String>, body: Rc<Evaluable>) {
        self.functions.borrow_mut().insert(name.into(), body);
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.borrow().contains_key(name)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter one more `eval`/function level. Returns false, leaving the
    /// depth untouched, when the shell's bound would be exceeded.
    pub fn increase_depth(&mut self) -> bool {
        if self.depth < self.shell.options().max_depth {
            self.depth += 1;
            true
        } else {
            warn!(depth = self.depth, "run-time depth bound reached");
            false
        }
    }

    pub fn decrease_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ast;
    use crate::interpreter::streams::{empty_input, sink, CaptureBuffer};
    use crate::shell::ShellOptions;

    fn session() -> Session {
        Session::new(Rc::new(Shell::new()), empty_input(), sink(), sink())
    }

    #[test]
    fn test_lookup_prefers_locals() {
        let s = session();
        s.set_env("x", "env");
        assert_eq!(s.lookup("x").as_deref(), Some("env"));
        s.set_var("x", "local");
        assert_eq!(s.lookup("x").as_deref(), Some("local"));
        assert_eq!(s.lookup("missing"), None);
        assert_eq!(s.get_env("missing"), "");
    }

    #[test]
    fn test_subshell_copies_tables() {
        let parent = session().with_args(vec!["name".into(), "a".into()]);
        parent.set_var("v", "1");
        let child = parent.subshell(empty_input(), sink(), sink());
        child.set_var("v", "2");
        child.set_env("e", "x");
        child.set_function("f", Rc::new(Ast::null(0)));
        assert_eq!(parent.get_var("v"), "1");
        assert!(!parent.has_env("e"));
        assert!(!parent.has_function("f"));
        assert_eq!(child.arg(1), "a");
    }

    #[test]
    fn test_function_call_shares_env_and_functions() {
        let parent = session();
        parent.set_var("v", "1");
        let child = parent.function_call(vec!["f".into(), "x".into()]);
        assert!(!child.has_var("v"));
        assert_eq!(child.arg(0), "f");
        assert_eq!(child.arg(1), "x");
        child.set_env("e", "shared");
        child.set_function("g", Rc::new(Ast::null(0)));
        assert_eq!(parent.get_env("e"), "shared");
        assert!(parent.has_function("g"));
    }

    #[test]
    fn test_pipe_stages_share_everything_but_streams() {
        let parent = session();
        let buffer = CaptureBuffer::new();
        let left = parent.pipe_left(buffer.stream());
        left.set_var("v", "left");
        left.write_out("piped");
        assert_eq!(parent.get_var("v"), "left");
        assert_eq!(buffer.contents(), "piped");

        let right = parent.pipe_right(empty_input());
        right.set_env("e", "right");
        assert_eq!(parent.get_env("e"), "right");
    }

    #[test]
    fn test_depth_is_bounded() {
        let shell = Shell::new().with_options(ShellOptions { max_depth: 2, ..Default::default() });
        let mut s = Session::new(Rc::new(shell), empty_input(), sink(), sink());
        assert!(s.increase_depth());
        assert!(s.increase_depth());
        assert!(!s.increase_depth());
        assert_eq!(s.depth(), 2);
        s.decrease_depth();
        s.decrease_depth();
        s.decrease_depth();
        assert_eq!(s.depth(), 0);
    }
}
