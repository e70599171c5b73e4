// src/commands/seq/mod.rs
use crate::commands::Command;
use crate::interpreter::Session;
use crate::parser::types::is_number;
use crate::status::Status;

pub const ERROR_PARAM_NUMBER: Status = Status::command(1);
pub const ERROR_INT_FORMAT: Status = Status::command(2);
pub const ERROR_INT_BOUNDS: Status = Status::command(3);
pub const ERROR_ITERATION_LOGIC: Status = Status::command(4);

/// `seq FIRST [STEP] LAST`, space separated, without a trailing newline.
pub struct SeqCommand;

impl Command for SeqCommand {
    fn name(&self) -> &'static str { "seq" }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        if args.len() != 2 && args.len() != 3 {
            session.write_err(&format!("seq: takes 2-3 parameters, but received {}.\n", args.len()));
            return ERROR_PARAM_NUMBER;
        }

        let mut values = Vec::with_capacity(3);
        for arg in args {
            match parse_int(arg) {
                Ok(value) => values.push(value),
                Err(status) => {
                    let message = if status == ERROR_INT_FORMAT {
                        format!("seq: value \u{201C}{}\u{201D} is no integer\n", arg)
                    } else {
                        format!("seq: value \u{201C}{}\u{201D} out of bounds [ {} : {} ]\n", arg, i64::MIN, i64::MAX)
                    };
                    session.write_err(&message);
                    return status;
                }
            }
        }

        let (first, step, last) = match values[..] {
            [first, last] => (first, if first > last { -1 } else { 1 }, last),
            [first, step, last] => {
                if (first > last && step >= 0) || (first < last && step <= 0) {
                    session.write_err(&format!("seq: can not iterate: [ {} : {} : {} ]\n", first, step, last));
                    return ERROR_ITERATION_LOGIC;
                }
                (first, step, last)
            }
            _ => return ERROR_PARAM_NUMBER,
        };

        session.write_out(&sequence(first, step, last).join(" "));
        Status::SUCCESS
    }
}

fn parse_int(text: &str) -> Result<i64, Status> {
    if !is_number(text) {
        return Err(ERROR_INT_FORMAT);
    }
    text.parse::<i64>().map_err(|_| ERROR_INT_BOUNDS)
}

/// Values from `first` towards `last`, inclusive. Stops early rather than
/// overflowing.
fn sequence(first: i64, step: i64, last: i64) -> Vec<String> {
    let mut out = vec![first.to_string()];
    let mut current = first;
    loop {
        let Some(next) = current.checked_add(step) else { break };
        let in_range = if first < last { next <= last } else if first > last { next >= last } else { false };
        if !in_range {
            break;
        }
        out.push(next.to_string());
        current = next;
    }
    out
}
