//! Word Expansion
//!
//! Turns `Expandable` nodes into strings. With `split` set, single-valued
//! results are field-split on space, tab and newline; without it (inside
//! double quotes) every result stays one string.
//!
//! A command expression glues adjacent expansions into words. Explicit
//! split markers (`None` parts, the literal whitespace between words) end
//! the current word. When one expansion yields several fields, the first
//! glues onto the word being built and the last starts the next one, so
//! `a${multi}b` produces `a<first> ... <last>b`.

use std::rc::Rc;

use crate::ast::types::{ArgNode, SpecialVar, SubstitutionNode, VariableNode};
use crate::ast::{CommandExprNode, Expandable};
use crate::interpreter::evaluate::evaluate;
use crate::interpreter::session::Session;
use crate::interpreter::streams::CaptureBuffer;
use crate::parser::types::is_number;

/// What `$0` expands to.
pub const SCRIPT_NAME_PLACEHOLDER: &str = "emptyset";

/// Expand one node, appending the produced strings to `out`.
pub fn expand(node: &Expandable, out: &mut Vec<String>, session: &Session, split: bool) {
    match node {
        Expandable::Word(word) => out.push(word.text.clone()),
        Expandable::Unicode(word) => out.push(word.text.clone()),
        Expandable::SingleQuoted(quoted) | Expandable::DoubleQuoted(quoted) => {
            let mut text = String::new();
            let mut parts = Vec::new();
            for part in &quoted.parts {
                expand(part, &mut parts, session, false);
                for piece in parts.drain(..) {
                    text.push_str(&piece);
                }
            }
            out.push(text);
        }
        Expandable::Backquote(node) | Expandable::DollarCommand(node) => {
            let text = substitute(node, session);
            push_value(out, text, split);
        }
        Expandable::Arg(ArgNode { index, .. }) | Expandable::BracedArg(ArgNode { index, .. }) => {
            push_value(out, session.arg(*index), split);
        }
        Expandable::Variable(VariableNode { name, .. })
        | Expandable::BracedVariable(VariableNode { name, .. }) => {
            push_value(out, session.lookup(name).unwrap_or_default(), split);
        }
        Expandable::BracedArgIndirect(ArgNode { index, .. }) => {
            let target = session.arg(*index);
            push_value(out, resolve_indirect(session, &target), split);
        }
        Expandable::BracedVariableIndirect(VariableNode { name, .. }) => {
            let value = match session.lookup(name) {
                Some(target) => resolve_indirect(session, &target),
                None => String::new(),
            };
            push_value(out, value, split);
        }
        Expandable::Special(special) => {
            push_value(out, special_value(session, special.kind), split);
        }
    }
}

/// Expand a command expression into argv, gluing adjacent pieces.
pub fn expand_command(expr: &CommandExprNode, out: &mut Vec<String>, session: &Session) {
    let mut word = String::new();
    // A quoted empty string still makes a word.
    let mut pending = false;
    let mut fields = Vec::new();

    for part in &expr.parts {
        let Some(part) = part else {
            if pending {
                out.push(std::mem::take(&mut word));
                pending = false;
            }
            continue;
        };

        fields.clear();
        expand(part, &mut fields, session, true);
        let count = fields.len();
        let mut drained = fields.drain(..);
        let Some(first) = drained.next() else {
            continue;
        };
        word.push_str(&first);
        pending = true;
        if count > 1 {
            out.push(std::mem::take(&mut word));
            for (i, field) in drained.enumerate() {
                if i + 2 == count {
                    word = field;
                } else {
                    out.push(field);
                }
            }
        }
    }

    if pending {
        out.push(word);
    }
}

/// Split on space, tab and newline, dropping empty fields.
pub fn split_words(out: &mut Vec<String>, text: &str) {
    out.extend(
        text.split([' ', '\t', '\n'])
            .filter(|field| !field.is_empty())
            .map(str::to_string),
    );
}

fn push_value(out: &mut Vec<String>, value: String, split: bool) {
    if split {
        split_words(out, &value);
    } else {
        out.push(value);
    }
}

/// Run a substitution body in an isolated session and return its stdout.
fn substitute(node: &SubstitutionNode, session: &Session) -> String {
    let buffer = CaptureBuffer::new();
    let mut child = session.subshell(
        Rc::clone(session.input()),
        buffer.stream(),
        Rc::clone(session.error()),
    );
    // `break`/`continue` cannot be parsed inside a substitution.
    let _ = evaluate(&node.body, &mut child);
    buffer.contents()
}

/// One level of `${!x}` indirection: a numeric target names a positional
/// argument, anything else a variable.
fn resolve_indirect(session: &Session, target: &str) -> String {
    if is_number(target) {
        return target
            .parse::<usize>()
            .map(|index| session.arg(index))
            .unwrap_or_default();
    }
    session.lookup(target).unwrap_or_default()
}

fn special_value(session: &Session, kind: SpecialVar) -> String {
    match kind {
        SpecialVar::ScriptName => SCRIPT_NAME_PLACEHOLDER.to_string(),
        SpecialVar::ProcessId => process_id().to_string(),
        SpecialVar::ArgCount => session.args().len().saturating_sub(1).to_string(),
        SpecialVar::AllArgs => session.args().get(1..).unwrap_or_default().join(" "),
        SpecialVar::LastStatus => session.last_status().to_string(),
    }
}

#[cfg(unix)]
fn process_id() -> u32 {
    let pid = unsafe { libc::getpid() };
    u32::try_from(pid).unwrap_or_else(|_| std::process::id())
}

#[cfg(not(unix))]
fn process_id() -> u32 {
    std::process::id()
}
