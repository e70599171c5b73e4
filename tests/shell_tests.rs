//! End-to-end tests: echo, variables, seq, operators and control flow.

mod common;

use std::io::Read;

use common::{assert_outputs, assert_outputs_with, Harness};
use embed_bash::commands::env::ERROR_VARIABLE_NAME;
use embed_bash::{Command, Session, Shell, Status};

/// Copies its stdin to stdout between angle brackets.
struct Wrap;

impl Command for Wrap {
    fn name(&self) -> &'static str {
        "wrap"
    }

    fn run(&self, _args: &[String], session: &mut Session) -> Status {
        let mut text = String::new();
        if session.input().borrow_mut().read_to_string(&mut text).is_err() {
            return Status::ERROR;
        }
        session.write_out(&format!("<{text}>"));
        Status::SUCCESS
    }
}

#[test]
fn test_empty_programs() {
    assert_outputs(&[("", ""), ("()", ""), ("{}", ""), (";;;", "")]);
}

#[test]
fn test_echo_basic() {
    assert_outputs(&[
        ("echo", "\n"),
        ("echo -n", ""),
        ("echo 'Hello World!'", "Hello World!\n"),
        ("echo \"Hello World!\"", "Hello World!\n"),
        ("echo -n 'Hello World!'", "Hello World!"),
        ("echo -n \"Hello World!\"", "Hello World!"),
        ("echo -n \\\n 'Hello World!'", "Hello World!"),
        ("echo -n '$var'", "$var"),
        ("echo -n a; echo -n b;", "ab"),
        ("echo -n a && echo -n b;", "ab"),
        ("echo -n a || echo -n b;", "a"),
        (r#"echo -n "\n\t\\\"\'""#, "\n\t\\\"'"),
        (r#"echo -n "\x44\u2205\U00002205\uD83D\uDE00""#, "D\u{2205}\u{2205}\u{1F600}"),
        ("( echo -n )", ""),
        ("( echo -n  'Hello World!' )", "Hello World!"),
        ("{ echo -n }", ""),
        ("{ echo -n  'Hello World!' }", "Hello World!"),
        ("(echo -n  'Hello World!')", "Hello World!"),
        ("{echo -n  'Hello World!'}", "Hello World!"),
    ]);
}

#[test]
fn test_echo_variables() {
    assert_outputs_with(
        &[
            ("echo -n $pos1 $pos2", "env1 var2"),
            ("echo -n ${pos1} ${pos2}", "env1 var2"),
            (r#"echo -n "$pos1" "$pos2""#, "env1 var2"),
            (r#"echo -n "${pos1}" "${pos2}""#, "env1 var2"),
            (r#"echo -n "$pos1   $pos2""#, "env1   var2"),
            (r#"echo -n "${pos1}   ${pos2}""#, "env1   var2"),
            ("echo -n $(getenv pos1) $(getvar pos2)", "env1 var2"),
            ("echo -n \"$(getenv pos1)   $(getvar pos2)\"", "env1   var2"),
            ("echo -n `getenv pos1` `getvar pos2`", "env1 var2"),
            ("echo -n \"`getenv pos1`   `getvar pos2`\"", "env1   var2"),
            ("echo -n '$(getenv pos1)   $(getvar pos2)'", "$(getenv pos1)   $(getvar pos2)"),
            ("echo -n $(getenv pos1); echo -n $(getvar pos2)", "env1var2"),
            ("echo -n `getenv pos1`; echo -n `getvar pos2`", "env1var2"),
        ],
        |session| {
            session.set_env("pos1", "env1");
            session.set_env("pos2", "env2");
            session.set_var("pos2", "var2");
        },
    );
}

#[test]
fn test_seq() {
    assert_outputs(&[
        ("seq 1 5", "1 2 3 4 5"),
        ("seq 1 2 5", "1 3 5"),
        ("seq 5 -2 1", "5 3 1"),
        ("seq 5 1", "5 4 3 2 1"),
        ("echo -n $(seq 1 5)", "1 2 3 4 5"),
    ]);
}

#[test]
fn test_setenv_and_getenv() {
    let mut h = Harness::new();
    assert_eq!(h.run("setenv variable value"), Status::SUCCESS);
    assert_eq!(h.session.get_env("variable"), "value");
    assert_eq!(h.run("setenv 1234 value"), ERROR_VARIABLE_NAME);
    assert_eq!(h.run("getenv variable"), Status::SUCCESS);
    assert_eq!(h.out(), "value");
    assert_eq!(h.run("getenv 1234"), ERROR_VARIABLE_NAME);
}

#[test]
fn test_setvar_and_getvar() {
    let mut h = Harness::new();
    assert_eq!(h.run("setvar variable value"), Status::SUCCESS);
    assert_eq!(h.session.get_var("variable"), "value");
    assert!(!h.session.has_env("variable"));
    assert_eq!(h.run("getvar variable"), Status::SUCCESS);
    assert_eq!(h.out(), "value");
    assert_eq!(h.run("getvar 1234"), ERROR_VARIABLE_NAME);
}

#[test]
fn test_operators() {
    assert_outputs(&[
        ("echo -n a && echo -n b", "ab"),
        ("echo -n a || echo -n b", "a"),
        ("echo -n a && echo -n b || echo -n c && echo -n d", "ab"),
        ("echo -n a || echo -n b && echo -n c || echo -n d", "a"),
        ("echo -n a && echo -n b ; echo -n c && echo -n d", "abcd"),
        ("echo -n a || echo -n b ; echo -n c || echo -n d", "ac"),
        ("(echo -n a || echo -n b) && (echo -n c || echo -n d)", "ac"),
        ("{echo -n a || echo -n b} && {echo -n c || echo -n d}", "ac"),
        ("(echo -n a || echo -n b) || (echo -n c || echo -n d)", "a"),
        ("{echo -n a || echo -n b} || {echo -n c || echo -n d}", "a"),
        ("(echo -n a && echo -n b) && (echo -n c && echo -n d)", "abcd"),
        ("{echo -n a && echo -n b} && {echo -n c && echo -n d}", "abcd"),
    ]);
}

#[test]
fn test_control_structures() {
    assert_outputs(&[
        ("for num in $(seq 1 5);do echo -n $num; done", "12345"),
        ("for   num   in $(seq 1 5)   ;  do   echo -n $num;   done", "12345"),
        ("for num in $(seq 1 5);do echo -n $num; echo -n $num; done", "1122334455"),
        ("for num in $(seq 1 5);do echo -n $num; continue; echo -n $num; done", "12345"),
        ("for num in $(seq 1 5);do echo -n $num; break; echo -n $num; done", "1"),
        ("for   num   in   $(seq 1 5);   do echo -n $num;   continue   ; echo -n $num;   done", "12345"),
        ("for   num   in   $(seq 1 5);   do echo -n $num;   break      ; echo -n $num;   done", "1"),
        ("if [-z \"\"]; then echo -n true; fi", "true"),
        ("if [ ( -z \"\" ) && ( -n \"d\" ) ]; then echo -n true; fi", "true"),
        ("if [ ( -z \"\" ) ] && [ ( -n \"d\" ) ]; then echo -n true; fi", "true"),
        ("if [-n \"\"]; then else echo -n true; fi", "true"),
        ("if [-n \"\"]; then elif [-z \"\"]; then echo -n true; fi", "true"),
        ("if [-n \"\"]; then elif [-n \"\"]; then else echo -n true; fi", "true"),
        ("while [ -n \"\" ]; do done ", ""),
        ("until [ -z \"\" ]; do done ", ""),
        ("while [ -z \"$stop\" ]; do setvar stop stop; echo -n stop; done ", "stop"),
        ("until [ -n \"$stop\" ]; do setvar stop stop; echo -n stop; done ", "stop"),
        ("function ignore{} fcall ignore", ""),
        ("function echon {echo -n \"$1\"} fcall echon 'Hello World!'", "Hello World!"),
        ("function echon {echo -n $@} fcall echon Hello World!", "Hello World!"),
    ]);
}

#[test]
fn test_pipe_and_background() {
    let mut h = Harness::new();
    assert_eq!(h.run("echo -n a | echo -n b"), Status::SUCCESS);
    assert_eq!(h.out(), "b");

    let mut h = Harness::new();
    assert_eq!(h.run("echo -n hidden & echo -n shown"), Status::SUCCESS);
    assert_eq!(h.out(), "shown");
}

#[test]
fn test_pipe_feeds_left_output_to_right_input() {
    let cases = [
        ("echo -n a | (wrap)", "<a>"),
        ("echo -n b | { wrap }", "<b>"),
        ("echo x | wrap | wrap", "<<x\n>>"),
        ("wrap | wrap", "<<>>"),
        ("echo -n a | wrap; wrap", "<a><>"),
    ];
    for (source, expected) in cases {
        let mut shell = Shell::with_defaults();
        shell.register(Wrap);
        let mut h = Harness::with_shell(shell);
        assert_eq!(h.run(source), Status::SUCCESS, "{source}");
        assert_eq!(h.out(), expected, "{source}");
    }
}

#[test]
fn test_word_splitting_and_gluing() {
    assert_outputs_with(
        &[
            ("echo -n a${multi}b", "ax y zb"),
            ("for w in $multi; do echo -n \"[$w]\"; done", "[x][y][z]"),
            ("for w in \"$multi\"; do echo -n \"[$w]\"; done", "[x y z]"),
            ("for w in \"\" ''; do echo -n \"[$w]\"; done", "[][]"),
        ],
        |session| session.set_var("multi", "x y z"),
    );
}

#[test]
fn test_subshell_and_group_scoping() {
    assert_outputs(&[
        ("(setvar x 1); echo -n \"[$x]\"", "[]"),
        ("{setvar x 1}; echo -n \"[$x]\"", "[1]"),
        ("echo -n $(setvar x 1)\"[$x]\"", "[]"),
        ("(function f { echo -n f }); fcall f", ""),
    ]);
}

#[test]
fn test_last_status() {
    let mut h = Harness::new();
    h.run("nope; echo -n $?; echo -n $?");
    assert_eq!(h.out(), "270");
    assert_eq!(h.err(), "shell: \u{201C}nope\u{201D}: not found.\n");
}

#[test]
fn test_positional_arguments() {
    let mut h = Harness::new();
    h.session = h.session.with_args(vec!["script".into(), "a".into(), "b c".into()]);
    h.run("echo -n $0 $# $1 ${2} \"$@\"");
    assert_eq!(h.out(), "emptyset 2 a b c a b c");
}
