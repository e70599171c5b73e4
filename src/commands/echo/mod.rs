// src/commands/echo/mod.rs
use crate::commands::Command;
use crate::interpreter::Session;
use crate::status::Status;

pub struct EchoCommand;

impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn run(&self, args: &[String], session: &mut Session) -> Status {
        // Only a leading -n is an option
        let (newline, words) = match args.split_first() {
            Some((first, rest)) if first == "-n" => (false, rest),
            _ => (true, args),
        };

        let mut output = words.join(" ");
        if newline {
            output.push('\n');
        }
        session.write_out(&output);
        Status::SUCCESS
    }
}
