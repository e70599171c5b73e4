// src/commands/registry.rs
use std::collections::HashMap;
use super::types::Command;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Add a command, replacing any command of the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Command>> {
        self.commands.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use super::echo::EchoCommand;
use super::env::{GetenvCommand, SetenvCommand};
use super::eval::EvalCommand;
use super::fcall::FcallCommand;
use super::math::MathCommand;
use super::seq::SeqCommand;
use super::test_cmd::TestCommand;
use super::var::{GetvarCommand, SetvarCommand};

/// Register every built-in command.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(Box::new(EchoCommand));
    registry.register(Box::new(EvalCommand));
    registry.register(Box::new(GetenvCommand));
    registry.register(Box::new(GetvarCommand));
    registry.register(Box::new(SetenvCommand));
    registry.register(Box::new(SetvarCommand));
    registry.register(Box::new(SeqCommand));
    registry.register(Box::new(TestCommand));
    registry.register(Box::new(MathCommand));
    registry.register(Box::new(FcallCommand));
}
