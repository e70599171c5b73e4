//! Shared helpers for the end-to-end tests.
#![allow(dead_code)]

use std::rc::Rc;

use embed_bash::interpreter::empty_input;
use embed_bash::{CaptureBuffer, Session, Shell, Status};

pub struct Harness {
    pub session: Session,
    pub out: CaptureBuffer,
    pub err: CaptureBuffer,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_shell(Shell::with_defaults())
    }

    pub fn with_shell(shell: Shell) -> Self {
        let out = CaptureBuffer::new();
        let err = CaptureBuffer::new();
        let session = Session::new(Rc::new(shell), empty_input(), out.stream(), err.stream());
        Self { session, out, err }
    }

    pub fn run(&mut self, source: &str) -> Status {
        Shell::run(source, &mut self.session)
    }

    pub fn out(&self) -> String {
        self.out.contents()
    }

    pub fn err(&self) -> String {
        self.err.contents()
    }
}

/// Run each script in a fresh session and compare its stdout.
pub fn assert_outputs(cases: &[(&str, &str)]) {
    for (source, expected) in cases {
        let mut h = Harness::new();
        h.run(source);
        assert_eq!(h.out(), *expected, "script: {source:?}, stderr: {:?}", h.err());
    }
}

/// Same as `assert_outputs`, with a session prepared by `setup`.
pub fn assert_outputs_with(cases: &[(&str, &str)], setup: impl Fn(&Session)) {
    for (source, expected) in cases {
        let mut h = Harness::new();
        setup(&h.session);
        h.run(source);
        assert_eq!(h.out(), *expected, "script: {source:?}, stderr: {:?}", h.err());
    }
}
