//! Lexer for Shell Scripts
//!
//! The lexer scans raw text into a flat sequence of positioned, typed tokens.
//! Nested contexts (parentheses, braces, square brackets, backticks and
//! `$(...)`) are scanned by re-entering the same loop with the closing
//! delimiter, so an unbalanced opener is reported with its own error kind.
//!
//! Token text always borrows from the source. Runs of plain characters and
//! runs of whitespace grow the previous token's slice instead of allocating
//! new tokens.

use tracing::debug;

use crate::parser::types::{ParseException, SyntaxErrorKind};

/// Token types for the shell lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Word,
    Space,
    CmdSeparator, // ; or newline
    Escaped,      // \n \t \$ ...
    Unicode,      // \xHH \uHHHH \UHHHHHHHH
    QuoteSimple,
    QuoteDouble,
    QuoteBack,
    Dollar,
    DollarSpecial, // the char after $ in $0 $$ $# $@ $?
    Exclamation,   // ${!name}
    Pipe,          // |
    Or,            // ||
    Background,    // &
    And,           // &&
    OpenParenthesis,
    CloseParenthesis,
    OpenBrackets,
    CloseBrackets,
    OpenSqrBrackets,
    CloseSqrBrackets,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Word => "WORD",
            Self::Space => "SPACE",
            Self::CmdSeparator => "SEPARATOR",
            Self::Escaped => "ESCAPED",
            Self::Unicode => "UNICODE",
            Self::QuoteSimple => "'",
            Self::QuoteDouble => "\"",
            Self::QuoteBack => "`",
            Self::Dollar => "$",
            Self::DollarSpecial => "DOLLAR_SPECIAL",
            Self::Exclamation => "!",
            Self::Pipe => "|",
            Self::Or => "||",
            Self::Background => "&",
            Self::And => "&&",
            Self::OpenParenthesis => "(",
            Self::CloseParenthesis => ")",
            Self::OpenBrackets => "{",
            Self::CloseBrackets => "}",
            Self::OpenSqrBrackets => "[",
            Self::CloseSqrBrackets => "]",
        }
    }

    fn closing(delimiter: u8) -> TokenType {
        match delimiter {
            b')' => Self::CloseParenthesis,
            b'}' => Self::CloseBrackets,
            b']' => Self::CloseSqrBrackets,
            _ => Self::QuoteBack,
        }
    }
}

/// A lexer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenType,
    /// Byte offset in the source
    pub pos: usize,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    fn end(&self) -> usize {
        self.pos + self.text.len()
    }
}

/// Characters that form an `ESCAPED` token after a backslash.
const ESCAPABLE: &[u8] = b" nt\\'\"`$|&()[]{}";

/// Bracket nesting bound for the scanner itself. The parser enforces the
/// much tighter `MAX_PARSER_DEPTH` on the constructs it recurses into.
pub const MAX_LEXER_NESTING: usize = 256;

/// Tokenize a complete source text.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, ParseException> {
    let mut lexer = Lexer::new(source);
    lexer.scan(None, 0)?;
    debug!(source = source, tokens = lexer.tokens.len(), "tokenized");
    Ok(lexer.tokens)
}

pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nesting: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            nesting: 0,
            tokens: Vec::with_capacity(64),
        }
    }

    fn error(&self, kind: SyntaxErrorKind, pos: usize) -> ParseException {
        ParseException::new(kind, self.source, pos)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Byte length of the UTF-8 scalar starting at `pos`.
    fn char_len(&self, pos: usize) -> usize {
        self.source
            .get(pos..)
            .and_then(|rest| rest.chars().next())
            .map(char::len_utf8)
            .unwrap_or(1)
    }

    fn push(&mut self, kind: TokenType, pos: usize, len: usize) {
        let text = &self.source[pos..pos + len];
        self.tokens.push(Token { kind, pos, text });
    }

    /// Append one plain character, growing the last word when it is adjacent
    /// and was produced after index `begin`.
    fn push_word(&mut self, pos: usize, len: usize, begin: usize) {
        let merge = self.tokens.len() > begin
            && matches!(self.tokens.last(), Some(t) if t.kind == TokenType::Word && t.end() == pos);
        match self.tokens.last_mut() {
            Some(last) if merge => last.text = &self.source[last.pos..pos + len],
            _ => self.push(TokenType::Word, pos, len),
        }
    }

    fn push_space(&mut self, pos: usize, len: usize) {
        match self.tokens.last_mut() {
            Some(last) if last.kind == TokenType::Space && last.end() == pos => {
                last.text = &self.source[last.pos..pos + len];
            }
            _ => self.push(TokenType::Space, pos, len),
        }
    }

    /// Consume one plain character (the whole UTF-8 scalar) as word text.
    fn word_char(&mut self, pos: usize, begin: usize) {
        let len = self.char_len(pos);
        self.pos = pos + len;
        self.push_word(pos, len, begin);
    }

    /// Main scanning loop. With a delimiter, stops after emitting the
    /// matching closing token; `open` is where the opener was.
    fn scan(&mut self, delimiter: Option<u8>, open: usize) -> Result<(), ParseException> {
        if delimiter.is_some() {
            self.nesting += 1;
            if self.nesting > MAX_LEXER_NESTING {
                return Err(self.error(SyntaxErrorKind::MaxDepthReached, open));
            }
        }
        let mut begin = self.tokens.len();

        while let Some(c) = self.peek() {
            if Some(c) == delimiter {
                break;
            }
            let pos = self.pos;
            self.pos += 1;
            match c {
                b'\'' => self.scan_quote_simple(pos)?,
                b'"' => self.scan_quote_double(pos)?,
                b'`' => {
                    self.push(TokenType::QuoteBack, pos, 1);
                    self.scan(Some(b'`'), pos)?;
                    begin = self.tokens.len();
                }
                b'\\' => {
                    self.scan_backslash(pos, false)?;
                    begin = self.tokens.len();
                }
                b'$' => {
                    self.scan_dollar(pos)?;
                    begin = self.tokens.len();
                }
                b' ' | b'\t' => self.push_space(pos, 1),
                b'\n' | b';' => self.push(TokenType::CmdSeparator, pos, 1),
                b'|' => {
                    if self.peek() == Some(b'|') {
                        self.pos += 1;
                        self.push(TokenType::Or, pos, 2);
                    } else {
                        self.push(TokenType::Pipe, pos, 1);
                    }
                }
                b'&' => {
                    if self.peek() == Some(b'&') {
                        self.pos += 1;
                        self.push(TokenType::And, pos, 2);
                    } else {
                        self.push(TokenType::Background, pos, 1);
                    }
                }
                b'(' | b'{' | b'[' => {
                    let (kind, close) = match c {
                        b'(' => (TokenType::OpenParenthesis, b')'),
                        b'{' => (TokenType::OpenBrackets, b'}'),
                        _ => (TokenType::OpenSqrBrackets, b']'),
                    };
                    self.push(kind, pos, 1);
                    self.scan(Some(close), pos)?;
                    begin = self.tokens.len();
                }
                b')' | b'}' | b']' => {
                    return Err(self.error(SyntaxErrorKind::UnexpectedToken, pos));
                }
                _ => self.word_char(pos, begin),
            }
        }

        if let Some(delimiter) = delimiter {
            if self.peek() != Some(delimiter) {
                let kind = match delimiter {
                    b')' => SyntaxErrorKind::UnclosedParentheses,
                    b'}' => SyntaxErrorKind::UnclosedBrackets,
                    b']' => SyntaxErrorKind::UnclosedSqrBrackets,
                    b'`' => SyntaxErrorKind::UnclosedBackQuotes,
                    _ => SyntaxErrorKind::Generic,
                };
                return Err(self.error(kind, open));
            }
            let pos = self.pos;
            self.pos += 1;
            self.push(TokenType::closing(delimiter), pos, 1);
            self.nesting -= 1;
        }
        Ok(())
    }

    /// `'...'`: only escapes and plain text.
    fn scan_quote_simple(&mut self, open: usize) -> Result<(), ParseException> {
        self.push(TokenType::QuoteSimple, open, 1);
        let mut begin = self.tokens.len();
        loop {
            let pos = self.pos;
            match self.peek() {
                None => return Err(self.error(SyntaxErrorKind::UnclosedSimpleQuotes, open)),
                Some(b'\'') => {
                    self.pos += 1;
                    self.push(TokenType::QuoteSimple, pos, 1);
                    return Ok(());
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.scan_backslash(pos, true)?;
                    begin = self.tokens.len();
                }
                Some(_) => self.word_char(pos, begin),
            }
        }
    }

    /// `"..."`: escapes, dollar expansions and backticks; everything else,
    /// whitespace included, is word text.
    fn scan_quote_double(&mut self, open: usize) -> Result<(), ParseException> {
        self.push(TokenType::QuoteDouble, open, 1);
        let mut begin = self.tokens.len();
        loop {
            let pos = self.pos;
            match self.peek() {
                None => return Err(self.error(SyntaxErrorKind::UnclosedDoubleQuotes, open)),
                Some(b'"') => {
                    self.pos += 1;
                    self.push(TokenType::QuoteDouble, pos, 1);
                    return Ok(());
                }
                Some(b'`') => {
                    self.pos += 1;
                    self.push(TokenType::QuoteBack, pos, 1);
                    self.scan(Some(b'`'), pos)?;
                    begin = self.tokens.len();
                }
                Some(b'\\') => {
                    self.pos += 1;
                    self.scan_backslash(pos, true)?;
                    begin = self.tokens.len();
                }
                Some(b'$') => {
                    self.pos += 1;
                    self.scan_dollar(pos)?;
                    begin = self.tokens.len();
                }
                Some(_) => self.word_char(pos, begin),
            }
        }
    }

    /// Everything after a `$`.
    fn scan_dollar(&mut self, dollar: usize) -> Result<(), ParseException> {
        self.push(TokenType::Dollar, dollar, 1);
        let pos = self.pos;
        match self.peek() {
            Some(b'0' | b'$' | b'#' | b'@' | b'?') => {
                self.pos += 1;
                self.push(TokenType::DollarSpecial, pos, 1);
            }
            Some(b'1'..=b'9') => {
                self.pos += 1;
                self.push(TokenType::Word, pos, 1);
            }
            Some(b'{') => {
                self.pos += 1;
                self.scan_dollar_variable(pos)?;
            }
            Some(b'(') => {
                self.pos += 1;
                self.push(TokenType::OpenParenthesis, pos, 1);
                self.scan(Some(b')'), pos)?;
            }
            Some(c) if is_name_start(c) => {
                self.pos += 1;
                while self.peek().is_some_and(is_name_char) {
                    self.pos += 1;
                }
                self.push(TokenType::Word, pos, self.pos - pos);
            }
            _ => {
                // A lone `$` is plain text and never merges with a neighbour.
                self.tokens.pop();
                self.push(TokenType::Word, dollar, 1);
            }
        }
        Ok(())
    }

    /// `${name}`, `${digits}` and their `${!...}` indirect forms.
    fn scan_dollar_variable(&mut self, brace: usize) -> Result<(), ParseException> {
        self.push(TokenType::OpenBrackets, brace, 1);
        if self.peek() == Some(b'!') {
            self.push(TokenType::Exclamation, self.pos, 1);
            self.pos += 1;
        }
        let start = self.pos;
        match self.peek() {
            Some(b'1'..=b'9') => {
                self.pos += 1;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            Some(c) if is_name_start(c) => {
                self.pos += 1;
                while self.peek().is_some_and(is_name_char) {
                    self.pos += 1;
                }
            }
            _ => return Err(self.error(SyntaxErrorKind::InvalidVariableName, brace)),
        }
        if self.peek() != Some(b'}') {
            return Err(self.error(SyntaxErrorKind::UnclosedVariable, brace));
        }
        self.push(TokenType::Word, start, self.pos - start);
        self.push(TokenType::CloseBrackets, self.pos, 1);
        self.pos += 1;
        Ok(())
    }

    /// Everything after a `\`. `backslash` is the position of the `\`.
    fn scan_backslash(&mut self, backslash: usize, quoted: bool) -> Result<(), ParseException> {
        let Some(c) = self.peek() else {
            return Ok(());
        };
        match c {
            b'\n' => {
                self.pos += 1;
                if !quoted {
                    self.push_space(backslash, 2);
                }
            }
            b'x' | b'u' | b'U' => {
                let rest = &self.source[backslash..];
                let Some((_, len)) = decode_unicode_escape(rest) else {
                    return Err(self.error(SyntaxErrorKind::BadEncoding, backslash));
                };
                self.pos = backslash + len;
                self.push(TokenType::Unicode, backslash, len);
            }
            c if ESCAPABLE.contains(&c) => {
                self.pos += 1;
                self.push(TokenType::Escaped, backslash, 2);
            }
            _ => {
                // Unknown escapes are dropped.
                self.pos += self.char_len(self.pos);
            }
        }
        Ok(())
    }
}

fn is_name_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}

fn is_name_char(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

fn hex_value(text: &str, start: usize, digits: usize) -> Option<u32> {
    let hex = text.get(start..start + digits)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

/// Decode `\xHH`, `\uHHHH` (with `\uHHHH\uHHHH` surrogate pairs) or
/// `\UHHHHHHHH` at the start of `text`. Returns the character and the number
/// of bytes the escape spans.
pub fn decode_unicode_escape(text: &str) -> Option<(char, usize)> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'\\') {
        return None;
    }
    match bytes.get(1)? {
        b'x' => {
            let value = hex_value(text, 2, 2)?;
            if value > 0x7F {
                return None;
            }
            char::from_u32(value).map(|c| (c, 4))
        }
        b'u' => {
            let high = hex_value(text, 2, 4)?;
            match high {
                0xD800..=0xDBFF => {
                    if text.get(6..8)? != "\\u" {
                        return None;
                    }
                    let low = hex_value(text, 8, 4)?;
                    if !(0xDC00..=0xDFFF).contains(&low) {
                        return None;
                    }
                    let value = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    char::from_u32(value).map(|c| (c, 12))
                }
                0xDC00..=0xDFFF => None,
                _ => char::from_u32(high).map(|c| (c, 6)),
            }
        }
        b'U' => {
            let value = hex_value(text, 2, 8)?;
            char::from_u32(value).map(|c| (c, 10))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenType> {
        tokenize(source).unwrap().iter().map(|t| t.kind).collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize(source).unwrap().iter().map(|t| t.text.to_string()).collect()
    }

    #[test]
    fn test_words_and_spaces_merge() {
        let tokens = tokenize("echo   hello").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "echo");
        assert_eq!(tokens[1].kind, TokenType::Space);
        assert_eq!(tokens[1].text, "   ");
        assert_eq!(tokens[2].text, "hello");
        assert_eq!(tokens[2].pos, 7);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a|b||c&d&&e;f"),
            vec![
                TokenType::Word,
                TokenType::Pipe,
                TokenType::Word,
                TokenType::Or,
                TokenType::Word,
                TokenType::Background,
                TokenType::Word,
                TokenType::And,
                TokenType::Word,
                TokenType::CmdSeparator,
                TokenType::Word,
            ]
        );
    }

    #[test]
    fn test_multibyte_word() {
        assert_eq!(texts("héllo wörld"), vec!["héllo", " ", "wörld"]);
    }

    #[test]
    fn test_nested_brackets() {
        assert_eq!(
            kinds("(a{b})"),
            vec![
                TokenType::OpenParenthesis,
                TokenType::Word,
                TokenType::OpenBrackets,
                TokenType::Word,
                TokenType::CloseBrackets,
                TokenType::CloseParenthesis,
            ]
        );
    }

    #[test]
    fn test_unclosed_errors() {
        let cases = [
            ("(echo", SyntaxErrorKind::UnclosedParentheses, 0),
            ("{echo", SyntaxErrorKind::UnclosedBrackets, 0),
            ("[ -z", SyntaxErrorKind::UnclosedSqrBrackets, 0),
            ("`echo", SyntaxErrorKind::UnclosedBackQuotes, 0),
            ("'echo", SyntaxErrorKind::UnclosedSimpleQuotes, 0),
            ("\"echo", SyntaxErrorKind::UnclosedDoubleQuotes, 0),
            ("echo $(a", SyntaxErrorKind::UnclosedParentheses, 6),
            ("${abc", SyntaxErrorKind::UnclosedVariable, 1),
            ("${-}", SyntaxErrorKind::InvalidVariableName, 1),
        ];
        for (source, kind, pos) in cases {
            let err = tokenize(source).unwrap_err();
            assert_eq!(err.kind, kind, "source: {}", source);
            assert_eq!(err.pos, pos, "source: {}", source);
        }
    }

    #[test]
    fn test_nesting_bound() {
        let deep = format!("{}{}", "(".repeat(MAX_LEXER_NESTING + 1), ")".repeat(MAX_LEXER_NESTING + 1));
        let err = tokenize(&deep).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MaxDepthReached);
        assert_eq!(err.pos, MAX_LEXER_NESTING);

        let ok = format!("{}{}", "(".repeat(MAX_LEXER_NESTING), ")".repeat(MAX_LEXER_NESTING));
        assert!(tokenize(&ok).is_ok());
    }

    #[test]
    fn test_stray_close_is_unexpected() {
        let err = tokenize("echo )").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken);
        assert_eq!(err.pos, 5);
    }

    #[test]
    fn test_dollar_forms() {
        assert_eq!(
            kinds("$? $1 $name"),
            vec![
                TokenType::Dollar,
                TokenType::DollarSpecial,
                TokenType::Space,
                TokenType::Dollar,
                TokenType::Word,
                TokenType::Space,
                TokenType::Dollar,
                TokenType::Word,
            ]
        );
        assert_eq!(texts("$12"), vec!["$", "1", "2"]);
        assert_eq!(
            kinds("${!i}"),
            vec![
                TokenType::Dollar,
                TokenType::OpenBrackets,
                TokenType::Exclamation,
                TokenType::Word,
                TokenType::CloseBrackets,
            ]
        );
    }

    #[test]
    fn test_lone_dollar_is_word() {
        let tokens = tokenize("a$-").unwrap();
        assert_eq!(tokens.iter().map(|t| t.text).collect::<Vec<_>>(), vec!["a", "$", "-"]);
        assert!(tokens.iter().all(|t| t.kind == TokenType::Word));
    }

    #[test]
    fn test_dollar_command() {
        assert_eq!(
            kinds("$(a)"),
            vec![
                TokenType::Dollar,
                TokenType::OpenParenthesis,
                TokenType::Word,
                TokenType::CloseParenthesis,
            ]
        );
    }

    #[test]
    fn test_single_quotes_keep_dollar() {
        assert_eq!(texts("'a$b c'"), vec!["'", "a$b c", "'"]);
    }

    #[test]
    fn test_double_quotes_expand_dollar() {
        assert_eq!(
            kinds("\"a $b\""),
            vec![
                TokenType::QuoteDouble,
                TokenType::Word,
                TokenType::Dollar,
                TokenType::Word,
                TokenType::QuoteDouble,
            ]
        );
    }

    #[test]
    fn test_escapes() {
        let tokens = tokenize("\\n\\$\\x44").unwrap();
        assert_eq!(tokens[0].kind, TokenType::Escaped);
        assert_eq!(tokens[1].text, "\\$");
        assert_eq!(tokens[2].kind, TokenType::Unicode);
        assert_eq!(tokens[2].text, "\\x44");
    }

    #[test]
    fn test_surrogate_pair_spans_twelve_bytes() {
        let tokens = tokenize("\\uD83D\\uDE00").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text.len(), 12);
    }

    #[test]
    fn test_bad_encoding() {
        for source in ["\\xZZ", "\\x80", "\\uD83D", "\\uDE00", "\\U00110000", "\\u12"] {
            let err = tokenize(source).unwrap_err();
            assert_eq!(err.kind, SyntaxErrorKind::BadEncoding, "source: {}", source);
        }
    }

    #[test]
    fn test_line_continuation_is_space() {
        assert_eq!(kinds("a \\\n b"), vec![TokenType::Word, TokenType::Space, TokenType::Word]);
    }

    #[test]
    fn test_unknown_escape_is_dropped() {
        assert_eq!(texts("a\\qb"), vec!["a", "b"]);
        assert_eq!(texts("\\é"), Vec::<String>::new());
    }

    #[test]
    fn test_decode_unicode_escape() {
        assert_eq!(decode_unicode_escape("\\x44"), Some(('D', 4)));
        assert_eq!(decode_unicode_escape("\\u2205"), Some(('\u{2205}', 6)));
        assert_eq!(decode_unicode_escape("\\U00002205"), Some(('\u{2205}', 10)));
        assert_eq!(decode_unicode_escape("\\uD83D\\uDE00"), Some(('\u{1F600}', 12)));
        assert_eq!(decode_unicode_escape("\\q"), None);
    }
}
