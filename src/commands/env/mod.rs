// src/commands/env/mod.rs
use crate::commands::Command;
use crate::interpreter::Session;
use crate::parser::types::is_var_name;
use crate::status::Status;

pub const ERROR_PARAM_NUMBER: Status = Status::command(1);
pub const ERROR_VARIABLE_NAME: Status = Status::command(2);

/// Which session namespace a get/set command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    Env,
    Local,
}

/// Shared body of `getenv` and `getvar`.
pub(crate) fn get(command: &str, namespace: Namespace, args: &[String], session: &mut Session) -> Status {
    let [name] = args else {
        session.write_err(&format!("{}: takes 1 parameter, but received {}.\n", command, args.len()));
        return ERROR_PARAM_NUMBER;
    };
    if !is_var_name(name) {
        session.write_err(&format!("{}: \u{201C}{}\u{201D}: not a variable name.\n", command, name));
        return ERROR_VARIABLE_NAME;
    }

    let value = match namespace {
        Namespace::Env => session.get_env(name),
        Namespace::Local => session.get_var(name),
    };
    session.write_out(&value);
    Status::SUCCESS
}

/// Shared body of `setenv` and `setvar`.
pub(crate) fn set(command: &str, namespace: Namespace, args: &[String], session: &mut Session) -> Status {
    let [name, value] = args else {
        session.write_err(&format!("{}: takes 2 parameters, but received {}.\n", command, args.len()));
        return ERROR_PARAM_NUMBER;
    };
    if !is_var_name(name) {
        session.write_err(&format!("{}: \u{201C}{}\u{201D}: not a variable name.\n", command, name));
        return ERROR_VARIABLE_NAME;
    }

    match namespace {
        Namespace::Env => session.set_env(name.as_str(), value.as_str()),
        Namespace::Local => session.set_var(name.as_str(), value.as_str()),
    }
    Status::SUCCESS
}

pub struct GetenvCommand;

impl Command for GetenvCommand {
    fn name(&self) -> &'static str {
        "getenv"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        get(self.name(), Namespace::Env, args, session)
    }
}

pub struct SetenvCommand;

impl Command for SetenvCommand {
    fn name(&self) -> &'static str {
        "setenv"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        set(self.name(), Namespace::Env, args, session)
    }
}
