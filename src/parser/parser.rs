//! Recursive Descent Parser for Shell Scripts
//!
//! This parser consumes tokens from the lexer and produces an AST.
//!
//! Grammar (simplified):
//!   block        ::= (group | keyword)* (separated by ; or newline)
//!   group        ::= (command | ( block ) | { block } | [ test ])+
//!                    [ (| && ||) group ] [ & ]
//!   command      ::= (word | quote | escape | $expansion | `block`)+
//!   keyword      ::= if | for | while | until | break | continue | function
//!
//! An operator's right-hand side is the entire rest of the group, returned
//! as its own block; `operator::make` then settles precedence between
//! operator nodes.

use tracing::trace;

use crate::ast::operator;
use crate::ast::types::{
    ArgNode, Ast, CommandExprNode, ControlNode, Evaluable, Expandable, OperatorKind, QuotedNode,
    SpecialNode, SpecialVar, SubstitutionNode, VariableNode,
};
use crate::parser::cursor::{Keyword, TokenCursor};
use crate::parser::depth::DepthGuard;
use crate::parser::lexer::{decode_unicode_escape, tokenize, Token, TokenType};
use crate::parser::types::{
    is_arg_name, is_var_name, ParseException, ParseMode, SyntaxErrorKind, MAX_OPERATOR_CHAIN,
};

/// Tokenize and parse a complete program. An empty program parses to a
/// null command.
pub fn parse(source: &str) -> Result<Evaluable, ParseException> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(source, tokens);
    parser.parse()
}

/// Main parser struct
pub struct Parser<'a> {
    source: &'a str,
    cursor: TokenCursor<'a>,
    depth: DepthGuard,
}

/// An operator whose right-hand group is still being parsed.
struct PendingOperator {
    kind: OperatorKind,
    pos: usize,
    left: Evaluable,
    /// The enclosing group's expressions before `left`.
    expressions: Vec<Evaluable>,
    start: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: Vec<Token<'a>>) -> Self {
        Self {
            source,
            cursor: TokenCursor::new(tokens),
            depth: DepthGuard::default(),
        }
    }

    pub fn parse(&mut self) -> Result<Evaluable, ParseException> {
        let root = self.parse_block(None, ParseMode::NORMAL)?;
        Ok(root.unwrap_or_else(|| Ast::null(0)))
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    fn error(&self, kind: SyntaxErrorKind, pos: usize) -> ParseException {
        ParseException::new(kind, self.source, pos)
    }

    /// Run `f` one nesting level deeper.
    fn guarded<T>(
        &mut self,
        pos: usize,
        f: impl FnOnce(&mut Self) -> Result<T, ParseException>,
    ) -> Result<T, ParseException> {
        if !self.depth.push() {
            return Err(self.error(SyntaxErrorKind::MaxDepthReached, pos));
        }
        let result = f(self);
        self.depth.pop();
        result
    }

    /// Advance past any whitespace and return the first other token.
    fn get_non_space(&mut self) -> Option<Token<'a>> {
        let mut token = self.cursor.get();
        while token.is_some_and(|t| t.kind == TokenType::Space) {
            token = self.cursor.get();
        }
        token
    }

    /// Read the next non-space token and require a command separator.
    fn expect_separator(&mut self) -> Result<(), ParseException> {
        self.get_non_space();
        if !self.cursor.is(TokenType::CmdSeparator) {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, self.cursor.pos()));
        }
        Ok(())
    }

    /// Read the next non-space token and require it to be `keyword`.
    fn expect_keyword(
        &mut self,
        keyword: Keyword,
        kind: SyntaxErrorKind,
        pos: usize,
    ) -> Result<(), ParseException> {
        self.get_non_space();
        if self.cursor.keyword() != Some(keyword) {
            return Err(self.error(kind, pos));
        }
        Ok(())
    }

    // ===========================================================================
    // BLOCKS
    // ===========================================================================

    /// Statements up to the `end` token (end of input when `None`). The
    /// cursor sits on the opening token, whose position is reported if the
    /// block is never closed.
    fn parse_block(
        &mut self,
        end: Option<TokenType>,
        mode: ParseMode,
    ) -> Result<Option<Evaluable>, ParseException> {
        let start = self.cursor.pos();
        let group_mode = if end == Some(TokenType::QuoteBack) {
            mode.with(ParseMode::BACKQUOTE)
        } else {
            mode
        };
        let mut expressions = Vec::new();
        let mut closed = false;

        while let Some(token) = self.cursor.get() {
            if Some(token.kind) == end {
                closed = true;
                break;
            }
            self.parse_statement(token, group_mode, &mut expressions)?;
        }

        if let Some(end) = end {
            if !closed {
                let kind = match end {
                    TokenType::CloseParenthesis => SyntaxErrorKind::UnclosedParentheses,
                    TokenType::CloseBrackets => SyntaxErrorKind::UnclosedBrackets,
                    TokenType::CloseSqrBrackets => SyntaxErrorKind::UnclosedSqrBrackets,
                    TokenType::QuoteBack => SyntaxErrorKind::UnclosedBackQuotes,
                    _ => SyntaxErrorKind::Generic,
                };
                return Err(self.error(kind, start));
            }
        }
        Ok(Self::collect(start, expressions))
    }

    /// Statements up to one of the `ends` keywords, which is left as the
    /// current token. Running out of input is a `kind` error at `pos`.
    fn parse_keyword_block(
        &mut self,
        ends: &[Keyword],
        mode: ParseMode,
        kind: SyntaxErrorKind,
        pos: usize,
    ) -> Result<Option<Evaluable>, ParseException> {
        let start = self.cursor.pos();
        let mut expressions = Vec::new();
        let mut closed = false;

        while let Some(token) = self.cursor.get() {
            if self.cursor.keyword().is_some_and(|k| ends.contains(&k)) {
                closed = true;
                break;
            }
            self.parse_statement(token, mode, &mut expressions)?;
        }

        if !closed {
            return Err(self.error(kind, pos));
        }
        Ok(Self::collect(start, expressions))
    }

    /// One statement of a block, starting at the just-read `token`. Keywords
    /// are read by the command group too, so a construct can be followed by
    /// an operator.
    fn parse_statement(
        &mut self,
        token: Token<'a>,
        mode: ParseMode,
        expressions: &mut Vec<Evaluable>,
    ) -> Result<(), ParseException> {
        match token.kind {
            TokenType::Word
            | TokenType::OpenParenthesis
            | TokenType::OpenBrackets
            | TokenType::OpenSqrBrackets
            | TokenType::Escaped
            | TokenType::Unicode
            | TokenType::Dollar
            | TokenType::QuoteSimple
            | TokenType::QuoteDouble
            | TokenType::QuoteBack => {
                self.cursor.put_back();
                expressions.extend(self.parse_command_group(mode)?);
            }
            TokenType::Space | TokenType::CmdSeparator => {}
            _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
        }
        Ok(())
    }

    fn collect(start: usize, mut expressions: Vec<Evaluable>) -> Option<Evaluable> {
        match expressions.len() {
            0 => None,
            1 => expressions.pop(),
            _ => Some(Ast::block(start, expressions)),
        }
    }

    // ===========================================================================
    // COMMAND GROUPS
    // ===========================================================================

    /// Everything up to the next separator or closing token: commands and
    /// bracketed blocks, joined by operators, optionally sent to the
    /// background.
    ///
    /// An operator's right-hand side is the rest of the group. Chains are
    /// parsed iteratively: each operator parks its left-hand side on
    /// `pending` and the right-hand group is folded back in once it ends.
    fn parse_command_group(&mut self, mode: ParseMode) -> Result<Option<Evaluable>, ParseException> {
        let mut pending: Vec<PendingOperator> = Vec::new();
        let mut expressions = Vec::new();
        let mut token = self.get_non_space();
        let mut start = self.cursor.pos();

        loop {
            while let Some(current) = token {
                match current.kind {
                    TokenType::Word => {
                        if let Some(keyword) = self.cursor.keyword() {
                            // `then`, `fi`, `done`... belong to the enclosing block.
                            if !keyword.starts_statement() && !expressions.is_empty() {
                                self.cursor.put_back();
                                break;
                            }
                            expressions.push(self.parse_keyword(keyword, mode.nested())?);
                        } else {
                            self.cursor.put_back();
                            expressions.push(self.parse_command(mode)?);
                        }
                    }
                    TokenType::Escaped
                    | TokenType::Unicode
                    | TokenType::Dollar
                    | TokenType::QuoteSimple
                    | TokenType::QuoteDouble => {
                        self.cursor.put_back();
                        let command = self.parse_command(mode)?;
                        if !command.is_null() {
                            expressions.push(command);
                        }
                    }
                    TokenType::QuoteBack => {
                        self.cursor.put_back();
                        if mode.has(ParseMode::BACKQUOTE) {
                            break;
                        }
                        let command = self.parse_command(mode)?;
                        if !command.is_null() {
                            expressions.push(command);
                        }
                    }
                    TokenType::OpenParenthesis => expressions.push(self.parse_parentheses()?),
                    TokenType::OpenBrackets => expressions.push(self.parse_brackets(mode)?),
                    TokenType::OpenSqrBrackets => expressions.push(self.parse_sqr_brackets()?),
                    TokenType::CmdSeparator
                    | TokenType::CloseParenthesis
                    | TokenType::CloseBrackets
                    | TokenType::CloseSqrBrackets => {
                        self.cursor.put_back();
                        break;
                    }
                    TokenType::Background => {
                        let Some(last) = expressions.pop() else {
                            return Err(self.error(SyntaxErrorKind::UnexpectedToken, current.pos));
                        };
                        expressions.push(Ast::background(current.pos, last));
                        break;
                    }
                    TokenType::Pipe | TokenType::And | TokenType::Or => {
                        let kind = match current.kind {
                            TokenType::Pipe => OperatorKind::Pipe,
                            TokenType::And => OperatorKind::And,
                            _ => OperatorKind::Or,
                        };
                        let Some(left) = expressions.pop() else {
                            return Err(self.error(SyntaxErrorKind::UnexpectedToken, current.pos));
                        };
                        if pending.len() >= MAX_OPERATOR_CHAIN {
                            return Err(self.error(SyntaxErrorKind::MaxDepthReached, current.pos));
                        }
                        pending.push(PendingOperator {
                            kind,
                            pos: current.pos,
                            left,
                            expressions: std::mem::take(&mut expressions),
                            start,
                        });
                        token = self.get_non_space();
                        start = self.cursor.pos();
                        continue;
                    }
                    _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, current.pos)),
                }
                token = self.get_non_space();
            }

            let group = if expressions.is_empty() {
                None
            } else {
                Some(Ast::block(start, expressions))
            };
            let Some(operator) = pending.pop() else {
                return Ok(group);
            };
            let Some(right) = group else {
                return Err(self.error(SyntaxErrorKind::UnexpectedToken, operator.pos));
            };
            expressions = operator.expressions;
            expressions.push(operator::make(operator.kind, operator.pos, operator.left, right));
            start = operator.start;
            token = self.get_non_space();
        }
    }

    fn parse_parentheses(&mut self) -> Result<Evaluable, ParseException> {
        let pos = self.cursor.pos();
        trace!(pos, "subshell");
        self.guarded(pos, |p| {
            let block = p.parse_block(Some(TokenType::CloseParenthesis), ParseMode::NORMAL)?;
            Ok(match block {
                Some(block) => Ast::subshell(pos, vec![block]),
                None => Ast::null(pos),
            })
        })
    }

    fn parse_brackets(&mut self, mode: ParseMode) -> Result<Evaluable, ParseException> {
        let pos = self.cursor.pos();
        trace!(pos, "brace block");
        self.guarded(pos, |p| {
            let block = p.parse_block(Some(TokenType::CloseBrackets), mode.nested())?;
            Ok(match block {
                Some(block) => Ast::block(pos, vec![block]),
                None => Ast::null(pos),
            })
        })
    }

    fn parse_sqr_brackets(&mut self) -> Result<Evaluable, ParseException> {
        let pos = self.cursor.pos();
        let expression = self.parse_test_expression()?;
        self.cursor.get();
        if !self.cursor.is(TokenType::CloseSqrBrackets) {
            return Err(self.error(SyntaxErrorKind::UnclosedSqrBrackets, pos));
        }
        match expression {
            Some(expression) => Ok(Ast::test(pos, expression)),
            None => Err(self.error(SyntaxErrorKind::UnexpectedToken, pos)),
        }
    }

    // ===========================================================================
    // COMMANDS
    // ===========================================================================

    fn parse_command(&mut self, mode: ParseMode) -> Result<Evaluable, ParseException> {
        Ok(match self.parse_command_expression(mode)? {
            Some(expr) => Ast::command(expr.pos, expr),
            None => Ast::null(self.source.len()),
        })
    }

    /// The words of one command. Whitespace between words is kept as a `None`
    /// marker.
    fn parse_command_expression(
        &mut self,
        mode: ParseMode,
    ) -> Result<Option<CommandExprNode>, ParseException> {
        let mut parts: Vec<Option<Expandable>> = Vec::new();
        let mut start = None;

        while let Some(token) = self.cursor.get() {
            let part = match token.kind {
                TokenType::Word => Ast::word(token.pos, token.text),
                TokenType::Escaped | TokenType::Unicode => self.parse_unicode(token)?,
                TokenType::Space => {
                    if matches!(parts.last(), Some(Some(_))) {
                        parts.push(None);
                    }
                    continue;
                }
                TokenType::QuoteSimple => self.parse_quote_simple()?,
                TokenType::QuoteDouble => self.parse_quote_double()?,
                TokenType::QuoteBack => {
                    if mode.has(ParseMode::BACKQUOTE) {
                        self.cursor.put_back();
                        break;
                    }
                    self.parse_quote_back()?
                }
                TokenType::Dollar => self.parse_dollar()?,
                TokenType::CmdSeparator
                | TokenType::CloseParenthesis
                | TokenType::CloseBrackets
                | TokenType::CloseSqrBrackets
                | TokenType::Pipe
                | TokenType::Or
                | TokenType::Background
                | TokenType::And => {
                    self.cursor.put_back();
                    break;
                }
                TokenType::OpenBrackets if mode.has(ParseMode::FUNCTION_NAME) => {
                    self.cursor.put_back();
                    break;
                }
                _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
            };
            start.get_or_insert(token.pos);
            parts.push(Some(part));
        }

        Ok(start.map(|pos| CommandExprNode { pos, parts }))
    }

    /// The words between `[` and `]`. Parentheses and logical operators are
    /// plain words here; the `test` command interprets them.
    fn parse_test_expression(&mut self) -> Result<Option<CommandExprNode>, ParseException> {
        let mut parts: Vec<Option<Expandable>> = Vec::new();
        let mut start = None;

        while let Some(token) = self.cursor.get() {
            let part = match token.kind {
                TokenType::Word
                | TokenType::Or
                | TokenType::And
                | TokenType::OpenParenthesis
                | TokenType::CloseParenthesis => Ast::word(token.pos, token.text),
                TokenType::Escaped | TokenType::Unicode => self.parse_unicode(token)?,
                TokenType::Space => {
                    if matches!(parts.last(), Some(Some(_))) {
                        parts.push(None);
                    }
                    continue;
                }
                TokenType::QuoteSimple => self.parse_quote_simple()?,
                TokenType::QuoteDouble => self.parse_quote_double()?,
                TokenType::QuoteBack => self.parse_quote_back()?,
                TokenType::Dollar => self.parse_dollar()?,
                TokenType::CloseSqrBrackets => {
                    self.cursor.put_back();
                    break;
                }
                _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
            };
            start.get_or_insert(token.pos);
            parts.push(Some(part));
        }

        Ok(start.map(|pos| CommandExprNode { pos, parts }))
    }

    // ===========================================================================
    // WORDS, QUOTES AND EXPANSIONS
    // ===========================================================================

    fn parse_unicode(&self, token: Token<'a>) -> Result<Expandable, ParseException> {
        let bad = || self.error(SyntaxErrorKind::BadEncoding, token.pos);
        let escaped = token.text.chars().nth(1).ok_or_else(bad)?;
        let c = match escaped {
            'n' => '\n',
            't' => '\t',
            ' ' | '\\' | '\'' | '"' | '`' | '$' | '|' | '&' | '(' | ')' | '[' | ']' | '{'
            | '}' => escaped,
            'x' | 'u' | 'U' => decode_unicode_escape(token.text).ok_or_else(bad)?.0,
            _ => return Err(bad()),
        };
        Ok(Ast::unicode(token.pos, c))
    }

    /// `'...'`. The cursor sits on the opening quote.
    fn parse_quote_simple(&mut self) -> Result<Expandable, ParseException> {
        let pos = self.cursor.pos();
        let mut parts = Vec::new();
        loop {
            let Some(token) = self.cursor.get() else {
                return Err(self.error(SyntaxErrorKind::UnclosedSimpleQuotes, pos));
            };
            match token.kind {
                TokenType::QuoteSimple => break,
                TokenType::Word => parts.push(Ast::word(token.pos, token.text)),
                TokenType::Escaped | TokenType::Unicode => parts.push(self.parse_unicode(token)?),
                _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
            }
        }
        Ok(Expandable::SingleQuoted(QuotedNode { pos, parts }))
    }

    /// `"..."`. The cursor sits on the opening quote.
    fn parse_quote_double(&mut self) -> Result<Expandable, ParseException> {
        let pos = self.cursor.pos();
        let mut parts = Vec::new();
        loop {
            let Some(token) = self.cursor.get() else {
                return Err(self.error(SyntaxErrorKind::UnclosedDoubleQuotes, pos));
            };
            match token.kind {
                TokenType::QuoteDouble => break,
                TokenType::Word => parts.push(Ast::word(token.pos, token.text)),
                TokenType::Escaped | TokenType::Unicode => parts.push(self.parse_unicode(token)?),
                TokenType::Dollar => parts.push(self.parse_dollar()?),
                TokenType::QuoteBack => parts.push(self.parse_quote_back()?),
                _ => return Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
            }
        }
        Ok(Expandable::DoubleQuoted(QuotedNode { pos, parts }))
    }

    /// `` `...` ``. The cursor sits on the opening backtick.
    fn parse_quote_back(&mut self) -> Result<Expandable, ParseException> {
        let pos = self.cursor.pos();
        trace!(pos, "backquote substitution");
        self.guarded(pos, |p| {
            let body = p
                .parse_block(Some(TokenType::QuoteBack), ParseMode::NORMAL)?
                .unwrap_or_else(|| Ast::null(pos));
            Ok(Expandable::Backquote(SubstitutionNode { pos, body: Box::new(body) }))
        })
    }

    fn arg_index(&self, token: Token<'a>) -> Result<usize, ParseException> {
        token
            .text
            .parse::<usize>()
            .map_err(|_| self.error(SyntaxErrorKind::ArgOutOfRange, token.pos))
    }

    /// Everything after `$`. The cursor sits on the dollar token.
    fn parse_dollar(&mut self) -> Result<Expandable, ParseException> {
        let start = self.cursor.pos();
        let Some(token) = self.cursor.get() else {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, start));
        };
        match token.kind {
            TokenType::Word => {
                if is_arg_name(token.text) {
                    let index = self.arg_index(token)?;
                    Ok(Expandable::Arg(ArgNode { pos: token.pos, index }))
                } else if is_var_name(token.text) {
                    Ok(Expandable::Variable(VariableNode {
                        pos: token.pos,
                        name: token.text.to_string(),
                    }))
                } else {
                    Err(self.error(SyntaxErrorKind::InvalidVariableName, token.pos))
                }
            }
            TokenType::DollarSpecial => {
                let kind = token
                    .text
                    .chars()
                    .next()
                    .and_then(SpecialVar::from_char)
                    .ok_or_else(|| self.error(SyntaxErrorKind::UnexpectedToken, token.pos))?;
                Ok(Expandable::Special(SpecialNode { pos: token.pos, kind }))
            }
            TokenType::OpenBrackets => self.parse_dollar_variable(),
            TokenType::OpenParenthesis => self.parse_dollar_command(),
            _ => Err(self.error(SyntaxErrorKind::UnexpectedToken, token.pos)),
        }
    }

    /// `${name}`, `${n}`, `${!name}`, `${!n}`. The cursor sits on `{`.
    fn parse_dollar_variable(&mut self) -> Result<Expandable, ParseException> {
        let start = self.cursor.pos();
        let mut name = self.cursor.get();
        let indirect = name.is_some_and(|t| t.kind == TokenType::Exclamation);
        if indirect {
            name = self.cursor.get();
        }
        let Some(name) = name else {
            return Err(self.error(SyntaxErrorKind::UnclosedVariable, start));
        };
        if name.kind != TokenType::Word {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, start));
        }
        let numeric = is_arg_name(name.text);
        if !numeric && !is_var_name(name.text) {
            return Err(self.error(SyntaxErrorKind::InvalidVariableName, start));
        }
        if !self.cursor.get().is_some_and(|t| t.kind == TokenType::CloseBrackets) {
            return Err(self.error(SyntaxErrorKind::UnclosedVariable, start));
        }

        if numeric {
            let node = ArgNode { pos: name.pos, index: self.arg_index(name)? };
            Ok(if indirect {
                Expandable::BracedArgIndirect(node)
            } else {
                Expandable::BracedArg(node)
            })
        } else {
            let node = VariableNode { pos: name.pos, name: name.text.to_string() };
            Ok(if indirect {
                Expandable::BracedVariableIndirect(node)
            } else {
                Expandable::BracedVariable(node)
            })
        }
    }

    /// `$(...)`. The cursor sits on `(`.
    fn parse_dollar_command(&mut self) -> Result<Expandable, ParseException> {
        let pos = self.cursor.pos();
        trace!(pos, "command substitution");
        self.guarded(pos, |p| {
            let body = p
                .parse_block(Some(TokenType::CloseParenthesis), ParseMode::NORMAL)?
                .unwrap_or_else(|| Ast::null(pos));
            Ok(Expandable::DollarCommand(SubstitutionNode { pos, body: Box::new(body) }))
        })
    }

    // ===========================================================================
    // KEYWORDS
    // ===========================================================================

    fn parse_keyword(&mut self, keyword: Keyword, mode: ParseMode) -> Result<Evaluable, ParseException> {
        let pos = self.cursor.pos();
        trace!(pos, keyword = keyword.as_str(), "keyword");
        self.guarded(pos, |p| match keyword {
            Keyword::If => p.parse_if(pos, mode),
            Keyword::For => p.parse_for(pos, mode),
            Keyword::While | Keyword::Until => p.parse_loop(keyword, pos, mode),
            Keyword::Break | Keyword::Continue => p.parse_loop_control(keyword, pos, mode),
            Keyword::Function => p.parse_function(pos),
            _ => Err(p.error(SyntaxErrorKind::UnexpectedToken, pos)),
        })
    }

    /// `break` / `continue`: only inside a loop body and only when the
    /// statement ends right after the keyword.
    fn parse_loop_control(
        &mut self,
        keyword: Keyword,
        pos: usize,
        mode: ParseMode,
    ) -> Result<Evaluable, ParseException> {
        if mode.has(ParseMode::LOOP) {
            self.cursor.skip_spaces();
            let ends_statement = match self.cursor.peek() {
                None => true,
                Some(next) => matches!(
                    next.kind,
                    TokenType::CmdSeparator | TokenType::Or | TokenType::And
                ),
            };
            if ends_statement {
                let node = ControlNode { pos };
                return Ok(if keyword == Keyword::Break {
                    Evaluable::Break(node)
                } else {
                    Evaluable::Continue(node)
                });
            }
        }
        Err(self.error(SyntaxErrorKind::UnexpectedToken, pos))
    }

    /// `if cond; then block [elif ... | else block] fi`. Also handles the
    /// tail after `elif`, with `pos` at the `elif`.
    fn parse_if(&mut self, pos: usize, mode: ParseMode) -> Result<Evaluable, ParseException> {
        let Some(condition) = self.parse_command_group(ParseMode::NORMAL)? else {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, pos));
        };
        self.expect_separator()?;
        self.expect_keyword(Keyword::Then, SyntaxErrorKind::MissingKeywordThen, pos)?;

        let then_branch = self
            .parse_keyword_block(
                &[Keyword::Else, Keyword::Elif, Keyword::Fi],
                mode,
                SyntaxErrorKind::UnfinishedKeywordIf,
                pos,
            )?
            .unwrap_or_else(|| Ast::null(self.cursor.pos()));

        match self.cursor.keyword() {
            Some(Keyword::Else) => self.guarded(pos, |p| {
                let else_branch = p
                    .parse_keyword_block(&[Keyword::Fi], mode, SyntaxErrorKind::UnfinishedKeywordIf, pos)?
                    .unwrap_or_else(|| Ast::null(p.cursor.pos()));
                Ok(Ast::if_node(pos, condition, then_branch, Some(else_branch)))
            }),
            Some(Keyword::Elif) => self.guarded(pos, |p| {
                let elif_pos = p.cursor.pos();
                let else_branch = p.parse_if(elif_pos, mode)?;
                Ok(Ast::if_node(pos, condition, then_branch, Some(else_branch)))
            }),
            Some(Keyword::Fi) => Ok(Ast::if_node(pos, condition, then_branch, None)),
            _ => Err(self.error(SyntaxErrorKind::UnfinishedKeywordIf, pos)),
        }
    }

    /// `do block done`, with the loop flag set for the block.
    fn parse_loop_body(&mut self, pos: usize, mode: ParseMode) -> Result<Evaluable, ParseException> {
        self.expect_keyword(Keyword::Do, SyntaxErrorKind::MissingKeywordDo, pos)?;
        self.guarded(pos, |p| {
            let body = p
                .parse_keyword_block(
                    &[Keyword::Done],
                    mode.nested().with(ParseMode::LOOP),
                    SyntaxErrorKind::UnfinishedKeywordLoop,
                    pos,
                )?
                .unwrap_or_else(|| Ast::null(p.cursor.pos()));
            Ok(body)
        })
    }

    /// `for name in words; do block done`
    fn parse_for(&mut self, pos: usize, mode: ParseMode) -> Result<Evaluable, ParseException> {
        let variable = match self.get_non_space() {
            Some(token) if token.kind == TokenType::Word && is_var_name(token.text) => {
                token.text.to_string()
            }
            _ => return Err(self.error(SyntaxErrorKind::InvalidVariableName, pos)),
        };
        self.expect_keyword(Keyword::In, SyntaxErrorKind::MissingKeywordIn, pos)?;

        let Some(sequence) = self.parse_command_expression(ParseMode::NORMAL)? else {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, pos));
        };
        self.cursor.get();
        if !self.cursor.is(TokenType::CmdSeparator) {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, self.cursor.pos()));
        }

        let body = self.parse_loop_body(pos, mode)?;
        Ok(Ast::for_node(pos, variable, sequence, body))
    }

    /// `while cond; do block done` and `until cond; do block done`
    fn parse_loop(&mut self, keyword: Keyword, pos: usize, mode: ParseMode) -> Result<Evaluable, ParseException> {
        let Some(condition) = self.parse_command_group(ParseMode::NORMAL)? else {
            return Err(self.error(SyntaxErrorKind::UnexpectedToken, pos));
        };
        self.expect_separator()?;

        let body = self.parse_loop_body(pos, mode)?;
        Ok(if keyword == Keyword::Until {
            Ast::until_node(pos, condition, body)
        } else {
            Ast::while_node(pos, condition, body)
        })
    }

    /// `function name { block }`
    fn parse_function(&mut self, pos: usize) -> Result<Evaluable, ParseException> {
        self.cursor.skip_spaces();
        let Some(name) = self.parse_command_expression(ParseMode::FUNCTION_NAME)? else {
            return Err(self.error(SyntaxErrorKind::InvalidFunctionName, pos));
        };
        self.get_non_space();
        if !self.cursor.is(TokenType::OpenBrackets) {
            return Err(self.error(SyntaxErrorKind::InvalidFunctionBody, pos));
        }

        let block_pos = self.cursor.pos();
        trace!(pos, "function body");
        let body = self
            .parse_block(Some(TokenType::CloseBrackets), ParseMode::NORMAL)?
            .unwrap_or_else(|| Ast::null(block_pos));
        Ok(Ast::function(pos, name, body))
    }
}
