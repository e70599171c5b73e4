//! Abstract Syntax Tree (AST) Types
//!
//! Nodes come in two families. `Expandable` nodes produce strings (words,
//! quotes, substitutions, variable reads); `Evaluable` nodes produce a
//! status and side effects (commands, blocks, operators, control flow).
//! Every node records the byte offset where it began in the source.
//!
//! Architecture:
//!   Source → Lexer → Parser → AST → expand / evaluate → Session

use serde::Serialize;
use std::rc::Rc;

// =============================================================================
// EXPANDABLE NODES
// =============================================================================

/// Nodes that expand to zero or more strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expandable {
    /// Literal text
    Word(WordNode),
    /// A character written as an escape: `\n`, `\$`, `∅`...
    Unicode(WordNode),
    /// `'...'`
    SingleQuoted(QuotedNode),
    /// `"..."`
    DoubleQuoted(QuotedNode),
    /// `` `...` ``
    Backquote(SubstitutionNode),
    /// `$(...)`
    DollarCommand(SubstitutionNode),
    /// `$1`
    Arg(ArgNode),
    /// `$name`
    Variable(VariableNode),
    /// `${1}`
    BracedArg(ArgNode),
    /// `${name}`
    BracedVariable(VariableNode),
    /// `${!1}`
    BracedArgIndirect(ArgNode),
    /// `${!name}`
    BracedVariableIndirect(VariableNode),
    /// `$0 $$ $# $@ $?`
    Special(SpecialNode),
}

impl Expandable {
    pub fn pos(&self) -> usize {
        match self {
            Self::Word(n) | Self::Unicode(n) => n.pos,
            Self::SingleQuoted(n) | Self::DoubleQuoted(n) => n.pos,
            Self::Backquote(n) | Self::DollarCommand(n) => n.pos,
            Self::Arg(n) | Self::BracedArg(n) | Self::BracedArgIndirect(n) => n.pos,
            Self::Variable(n) | Self::BracedVariable(n) | Self::BracedVariableIndirect(n) => n.pos,
            Self::Special(n) => n.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordNode {
    pub pos: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedNode {
    pub pos: usize,
    /// May be empty: `''` and `""` expand to one empty string.
    pub parts: Vec<Expandable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionNode {
    pub pos: usize,
    pub body: Box<Evaluable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgNode {
    pub pos: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableNode {
    pub pos: usize,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialVar {
    /// `$0`
    ScriptName,
    /// `$$`
    ProcessId,
    /// `$#`
    ArgCount,
    /// `$@`
    AllArgs,
    /// `$?`
    LastStatus,
}

impl SpecialVar {
    pub fn from_char(c: char) -> Option<SpecialVar> {
        match c {
            '0' => Some(Self::ScriptName),
            '$' => Some(Self::ProcessId),
            '#' => Some(Self::ArgCount),
            '@' => Some(Self::AllArgs),
            '?' => Some(Self::LastStatus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpecialNode {
    pub pos: usize,
    pub kind: SpecialVar,
}

/// One shell command's words. `None` parts mark the whitespace between
/// words; adjacent `Some` parts glue into a single word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandExprNode {
    pub pos: usize,
    pub parts: Vec<Option<Expandable>>,
}

// =============================================================================
// EVALUABLE NODES
// =============================================================================

/// Nodes that run and return a status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Evaluable {
    Command(CommandNode),
    /// `{ ... }` or a statement list: shares the session
    Block(BlockNode),
    /// `( ... )`: each statement runs in a derived session
    Subshell(BlockNode),
    /// `cmd &`
    Background(BackgroundNode),
    /// `|`, `&&`, `||`
    Operator(OperatorNode),
    /// `[ ... ]`
    Test(TestNode),
    If(IfNode),
    For(ForNode),
    While(LoopNode),
    Until(LoopNode),
    Break(ControlNode),
    Continue(ControlNode),
    FunctionDef(FunctionDefNode),
    /// Empty program or empty group
    Null(ControlNode),
}

impl Evaluable {
    pub fn pos(&self) -> usize {
        match self {
            Self::Command(n) => n.pos,
            Self::Block(n) | Self::Subshell(n) => n.pos,
            Self::Background(n) => n.pos,
            Self::Operator(n) => n.pos,
            Self::Test(n) => n.pos,
            Self::If(n) => n.pos,
            Self::For(n) => n.pos,
            Self::While(n) | Self::Until(n) => n.pos,
            Self::Break(n) | Self::Continue(n) | Self::Null(n) => n.pos,
            Self::FunctionDef(n) => n.pos,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandNode {
    pub pos: usize,
    pub expr: CommandExprNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockNode {
    pub pos: usize,
    pub children: Vec<Evaluable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundNode {
    pub pos: usize,
    pub body: Box<Evaluable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperatorKind {
    Pipe,
    And,
    Or,
}

impl OperatorKind {
    /// Higher binds tighter.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Pipe => 5,
            Self::And => 4,
            Self::Or => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "|",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorNode {
    pub pos: usize,
    pub kind: OperatorKind,
    pub left: Box<Evaluable>,
    pub right: Box<Evaluable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestNode {
    pub pos: usize,
    pub expr: CommandExprNode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfNode {
    pub pos: usize,
    pub condition: Box<Evaluable>,
    pub then_branch: Box<Evaluable>,
    pub else_branch: Option<Box<Evaluable>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForNode {
    pub pos: usize,
    pub variable: String,
    pub sequence: CommandExprNode,
    pub body: Box<Evaluable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopNode {
    pub pos: usize,
    pub condition: Box<Evaluable>,
    pub body: Box<Evaluable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlNode {
    pub pos: usize,
}

/// `function name { body }`. The body is reference counted so the session's
/// function table can hold it after the defining tree is dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefNode {
    pub pos: usize,
    pub name: CommandExprNode,
    pub body: Rc<Evaluable>,
}

// =============================================================================
// FACTORY
// =============================================================================

/// Node constructors used by the parser. Composite nodes are only ever
/// built with their children present.
pub struct Ast;

impl Ast {
    pub fn word(pos: usize, text: impl Into<String>) -> Expandable {
        Expandable::Word(WordNode { pos, text: text.into() })
    }

    pub fn unicode(pos: usize, c: char) -> Expandable {
        Expandable::Unicode(WordNode { pos, text: c.to_string() })
    }

    pub fn command(pos: usize, expr: CommandExprNode) -> Evaluable {
        debug_assert!(!expr.parts.is_empty());
        Evaluable::Command(CommandNode { pos, expr })
    }

    pub fn block(pos: usize, children: Vec<Evaluable>) -> Evaluable {
        debug_assert!(!children.is_empty());
        Evaluable::Block(BlockNode { pos, children })
    }

    pub fn subshell(pos: usize, children: Vec<Evaluable>) -> Evaluable {
        debug_assert!(!children.is_empty());
        Evaluable::Subshell(BlockNode { pos, children })
    }

    pub fn background(pos: usize, body: Evaluable) -> Evaluable {
        Evaluable::Background(BackgroundNode { pos, body: Box::new(body) })
    }

    pub fn test(pos: usize, expr: CommandExprNode) -> Evaluable {
        debug_assert!(!expr.parts.is_empty());
        Evaluable::Test(TestNode { pos, expr })
    }

    pub fn if_node(
        pos: usize,
        condition: Evaluable,
        then_branch: Evaluable,
        else_branch: Option<Evaluable>,
    ) -> Evaluable {
        Evaluable::If(IfNode {
            pos,
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn for_node(pos: usize, variable: String, sequence: CommandExprNode, body: Evaluable) -> Evaluable {
        debug_assert!(!sequence.parts.is_empty());
        Evaluable::For(ForNode {
            pos,
            variable,
            sequence,
            body: Box::new(body),
        })
    }

    pub fn while_node(pos: usize, condition: Evaluable, body: Evaluable) -> Evaluable {
        Evaluable::While(LoopNode {
            pos,
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    pub fn until_node(pos: usize, condition: Evaluable, body: Evaluable) -> Evaluable {
        Evaluable::Until(LoopNode {
            pos,
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    pub fn function(pos: usize, name: CommandExprNode, body: Evaluable) -> Evaluable {
        debug_assert!(!name.parts.is_empty());
        Evaluable::FunctionDef(FunctionDefNode {
            pos,
            name,
            body: Rc::new(body),
        })
    }

    pub fn null(pos: usize) -> Evaluable {
        Evaluable::Null(ControlNode { pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_priorities() {
        assert!(OperatorKind::Pipe.priority() > OperatorKind::And.priority());
        assert!(OperatorKind::And.priority() > OperatorKind::Or.priority());
    }

    #[test]
    fn test_special_from_char() {
        assert_eq!(SpecialVar::from_char('?'), Some(SpecialVar::LastStatus));
        assert_eq!(SpecialVar::from_char('@'), Some(SpecialVar::AllArgs));
        assert_eq!(SpecialVar::from_char('x'), None);
    }

    #[test]
    fn test_positions() {
        let word = Ast::word(3, "abc");
        assert_eq!(word.pos(), 3);
        let expr = CommandExprNode { pos: 3, parts: vec![Some(word)] };
        let cmd = Ast::command(3, expr);
        let block = Ast::block(1, vec![cmd]);
        assert_eq!(block.pos(), 1);
        assert!(Ast::null(0).is_null());
    }
}
