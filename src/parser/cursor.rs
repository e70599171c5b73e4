//! Token Cursor
//!
//! A position over the token list with one-step pushback. The parser reads
//! with `get()`, peeks at neighbours relative to the token it last read,
//! and calls `put_back()` when a construct belongs to another rule.

use std::collections::HashMap;

use crate::parser::lexer::{Token, TokenType};

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Function,
    If,
    Then,
    Else,
    Elif,
    Fi,
    For,
    In,
    While,
    Until,
    Do,
    Done,
    Continue,
    Break,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::Elif => "elif",
            Self::Fi => "fi",
            Self::For => "for",
            Self::In => "in",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::Continue => "continue",
            Self::Break => "break",
        }
    }

    /// Keywords that open a construct (or are one, like `break`).
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Self::Function | Self::If | Self::For | Self::While | Self::Until | Self::Continue | Self::Break
        )
    }

    /// Keywords that end the `then` part of an `if`.
    pub fn is_if_delimiter(&self) -> bool {
        matches!(self, Self::Else | Self::Elif | Self::Fi)
    }
}

lazy_static::lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Keyword> = {
        let mut m = HashMap::new();
        for keyword in [
            Keyword::Function,
            Keyword::If,
            Keyword::Then,
            Keyword::Else,
            Keyword::Elif,
            Keyword::Fi,
            Keyword::For,
            Keyword::In,
            Keyword::While,
            Keyword::Until,
            Keyword::Do,
            Keyword::Done,
            Keyword::Continue,
            Keyword::Break,
        ] {
            m.insert(keyword.as_str(), keyword);
        }
        m
    };
}

/// Look up a reserved word by its spelling.
pub fn lookup_keyword(word: &str) -> Option<Keyword> {
    KEYWORDS.get(word).copied()
}

pub struct TokenCursor<'a> {
    tokens: Vec<Token<'a>>,
    /// Index of the token the next `get()` returns. The token last read
    /// sits at `next - 1`.
    next: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self { tokens, next: 0 }
    }

    /// Advance and return the token moved past, or `None` at the end.
    pub fn get(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.next).copied();
        if self.next <= self.tokens.len() {
            self.next += 1;
        }
        token
    }

    /// Rewind one position.
    pub fn put_back(&mut self) {
        self.next = self.next.saturating_sub(1);
    }

    /// The token last returned by `get()`.
    pub fn current(&self) -> Option<Token<'a>> {
        self.next.checked_sub(1).and_then(|i| self.tokens.get(i)).copied()
    }

    /// The token after the current one.
    pub fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.next).copied()
    }

    /// The token before the current one.
    pub fn previous(&self) -> Option<Token<'a>> {
        self.next.checked_sub(2).and_then(|i| self.tokens.get(i)).copied()
    }

    pub fn is(&self, kind: TokenType) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    pub fn is_next(&self, kind: TokenType) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// Consume any run of whitespace tokens.
    pub fn skip_spaces(&mut self) {
        while self.is_next(TokenType::Space) {
            self.next += 1;
        }
    }

    /// Byte position of the current token. Before the first read this is 0;
    /// past the end it is where the last token ends.
    pub fn pos(&self) -> usize {
        match self.current() {
            Some(token) => token.pos,
            None if self.next == 0 => 0,
            None => self.tokens.last().map(|t| t.pos + t.text.len()).unwrap_or(0),
        }
    }

    /// The current token read as a keyword. A word only counts as a keyword
    /// when it stands alone: followed by nothing, whitespace, a separator or
    /// a bracket of any kind.
    pub fn keyword(&self) -> Option<Keyword> {
        let token = self.current()?;
        if token.kind != TokenType::Word {
            return None;
        }
        let keyword = lookup_keyword(token.text)?;
        let standalone = match self.peek() {
            None => true,
            Some(next) => matches!(
                next.kind,
                TokenType::Space
                    | TokenType::CmdSeparator
                    | TokenType::OpenParenthesis
                    | TokenType::CloseParenthesis
                    | TokenType::OpenBrackets
                    | TokenType::CloseBrackets
                    | TokenType::OpenSqrBrackets
                    | TokenType::CloseSqrBrackets
            ),
        };
        standalone.then_some(keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;

    #[test]
    fn test_get_and_put_back() {
        let tokens = tokenize("a b").unwrap();
        let mut cursor = TokenCursor::new(tokens);
        assert!(cursor.current().is_none());
        assert_eq!(cursor.get().unwrap().text, "a");
        assert_eq!(cursor.get().unwrap().kind, TokenType::Space);
        assert_eq!(cursor.previous().unwrap().text, "a");
        cursor.put_back();
        assert_eq!(cursor.current().unwrap().text, "a");
        assert!(cursor.is_next(TokenType::Space));
    }

    #[test]
    fn test_get_past_end_is_balanced_by_put_back() {
        let tokens = tokenize("a").unwrap();
        let mut cursor = TokenCursor::new(tokens);
        assert!(cursor.get().is_some());
        assert!(cursor.get().is_none());
        cursor.put_back();
        assert!(cursor.get().is_none());
        cursor.put_back();
        cursor.put_back();
        assert_eq!(cursor.get().unwrap().text, "a");
    }

    #[test]
    fn test_keyword_requires_standalone_word() {
        let mut cursor = TokenCursor::new(tokenize("if x").unwrap());
        cursor.get();
        assert_eq!(cursor.keyword(), Some(Keyword::If));

        let mut cursor = TokenCursor::new(tokenize("ifconfig").unwrap());
        cursor.get();
        assert_eq!(cursor.keyword(), None);

        let mut cursor = TokenCursor::new(tokenize("fi").unwrap());
        cursor.get();
        assert_eq!(cursor.keyword(), Some(Keyword::Fi));

        let mut cursor = TokenCursor::new(tokenize("do$x").unwrap());
        cursor.get();
        assert_eq!(cursor.keyword(), None);

        let mut cursor = TokenCursor::new(tokenize("done;").unwrap());
        cursor.get();
        assert_eq!(cursor.keyword(), Some(Keyword::Done));
    }

    #[test]
    fn test_if_delimiters() {
        assert!(Keyword::Elif.is_if_delimiter());
        assert!(Keyword::Fi.is_if_delimiter());
        assert!(!Keyword::Then.is_if_delimiter());
        assert_eq!(lookup_keyword("until"), Some(Keyword::Until));
        assert_eq!(lookup_keyword("case"), None);
    }
}
