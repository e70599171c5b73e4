//! Tree Evaluation
//!
//! Walks an `Evaluable` tree against a session. Every normal completion
//! becomes the session's last status. `break` and `continue` travel up as
//! `EvalOutcome` signals until the nearest loop consumes them.

use std::rc::Rc;

use tracing::debug;

use crate::ast::types::{BlockNode, ForNode, FunctionDefNode, IfNode, LoopNode, OperatorNode};
use crate::ast::{CommandExprNode, Evaluable, OperatorKind};
use crate::commands::test_cmd::TestCommand;
use crate::commands::Command;
use crate::interpreter::errors::{propagate, EvalOutcome};
use crate::interpreter::expand::expand_command;
use crate::interpreter::session::Session;
use crate::interpreter::streams::{input_from, CaptureBuffer};
use crate::parser::types::is_var_name;
use crate::status::Status;

/// Evaluate a tree, recording its status as the session's last status.
pub fn evaluate(node: &Evaluable, session: &mut Session) -> EvalOutcome {
    let outcome = match node {
        Evaluable::Command(command) => run_command(&command.expr, session).into(),
        Evaluable::Block(block) => evaluate_block(block, session),
        Evaluable::Subshell(block) => evaluate_subshell(block, session),
        // Job control is not supported: the payload is dropped.
        Evaluable::Background(_) => EvalOutcome::SUCCESS,
        Evaluable::Operator(operator) => evaluate_operator(operator, session),
        Evaluable::Test(test) => run_test(&test.expr, session).into(),
        Evaluable::If(node) => evaluate_if(node, session),
        Evaluable::For(node) => evaluate_for(node, session),
        Evaluable::While(node) => evaluate_loop(node, session, true),
        Evaluable::Until(node) => evaluate_loop(node, session, false),
        Evaluable::Break(_) => EvalOutcome::Break,
        Evaluable::Continue(_) => EvalOutcome::Continue,
        Evaluable::FunctionDef(node) => define_function(node, session).into(),
        Evaluable::Null(_) => EvalOutcome::SUCCESS,
    };
    if let EvalOutcome::Status(status) = outcome {
        session.set_last_status(status);
    }
    outcome
}

// =============================================================================
// COMMANDS
// =============================================================================

fn run_command(expr: &CommandExprNode, session: &mut Session) -> Status {
    let mut argv = Vec::new();
    expand_command(expr, &mut argv, session);
    debug!(argv = ?argv, "command");

    let Some((name, args)) = argv.split_first() else {
        return Status::SUCCESS;
    };

    let shell = Rc::clone(session.shell());
    match shell.get(name) {
        Some(command) => command.run(args, session),
        None => {
            shell.reporter().command_not_found(session, name);
            Status::COMMAND_NOT_FOUND
        }
    }
}

/// `[ ... ]` runs the registered `test` command, or the built-in one when
/// the host has not registered any.
fn run_test(expr: &CommandExprNode, session: &mut Session) -> Status {
    let mut args = Vec::new();
    expand_command(expr, &mut args, session);
    debug!(args = ?args, "test");

    let shell = Rc::clone(session.shell());
    match shell.get("test") {
        Some(command) => command.run(&args, session),
        None => TestCommand.run(&args, session),
    }
}

fn define_function(node: &FunctionDefNode, session: &mut Session) -> Status {
    let mut names = Vec::new();
    expand_command(&node.name, &mut names, session);
    match names.as_slice() {
        [name] if is_var_name(name) => {
            debug!(function = name.as_str(), "define function");
            session.set_function(name.clone(), Rc::clone(&node.body));
            Status::SUCCESS
        }
        _ => {
            let shell = Rc::clone(session.shell());
            shell.reporter().invalid_function_name(session, &names.join(" "));
            Status::INVALID_FUNCTION_NAME
        }
    }
}

// =============================================================================
// BLOCKS AND OPERATORS
// =============================================================================

fn evaluate_block(block: &BlockNode, session: &mut Session) -> EvalOutcome {
    let stop_on_not_found = session.shell().options().stop_on_command_not_found;
    for child in &block.children {
        let status = propagate!(evaluate(child, session));
        if stop_on_not_found && status == Status::COMMAND_NOT_FOUND {
            break;
        }
    }
    EvalOutcome::Status(session.last_status())
}

/// Each statement of `( ... )` runs in its own subshell session.
fn evaluate_subshell(block: &BlockNode, session: &mut Session) -> EvalOutcome {
    let stop_on_not_found = session.shell().options().stop_on_command_not_found;
    let mut last = session.last_status();
    for child in &block.children {
        let mut subshell = session.subshell(
            Rc::clone(session.input()),
            Rc::clone(session.output()),
            Rc::clone(session.error()),
        );
        last = propagate!(evaluate(child, &mut subshell));
        if stop_on_not_found && last == Status::COMMAND_NOT_FOUND {
            break;
        }
    }
    EvalOutcome::Status(last)
}

fn evaluate_operator(node: &OperatorNode, session: &mut Session) -> EvalOutcome {
    match node.kind {
        OperatorKind::And => {
            let left = propagate!(evaluate(&node.left, session));
            if left.is_success() {
                evaluate(&node.right, session)
            } else {
                left.into()
            }
        }
        OperatorKind::Or => {
            let left = propagate!(evaluate(&node.left, session));
            if left.is_success() {
                left.into()
            } else {
                evaluate(&node.right, session)
            }
        }
        OperatorKind::Pipe => {
            let buffer = CaptureBuffer::new();
            let mut left = session.pipe_left(buffer.stream());
            propagate!(evaluate(&node.left, &mut left));
            let mut right = session.pipe_right(input_from(buffer.take()));
            evaluate(&node.right, &mut right)
        }
    }
}

// =============================================================================
// CONTROL FLOW
// =============================================================================

fn evaluate_if(node: &IfNode, session: &mut Session) -> EvalOutcome {
    let condition = propagate!(evaluate(&node.condition, session));
    if condition.is_success() {
        evaluate(&node.then_branch, session)
    } else if let Some(else_branch) = &node.else_branch {
        evaluate(else_branch, session)
    } else {
        condition.into()
    }
}

fn evaluate_for(node: &ForNode, session: &mut Session) -> EvalOutcome {
    let mut items = Vec::new();
    expand_command(&node.sequence, &mut items, session);
    for item in items {
        session.set_var(node.variable.as_str(), item);
        if evaluate(&node.body, session) == EvalOutcome::Break {
            break;
        }
    }
    EvalOutcome::Status(session.last_status())
}

/// `while` runs the body while the condition succeeds, `until` while it
/// fails.
fn evaluate_loop(node: &LoopNode, session: &mut Session, run_on_success: bool) -> EvalOutcome {
    loop {
        let condition = propagate!(evaluate(&node.condition, session));
        if condition.is_success() != run_on_success {
            break;
        }
        if evaluate(&node.body, session) == EvalOutcome::Break {
            break;
        }
    }
    EvalOutcome::Status(session.last_status())
}
