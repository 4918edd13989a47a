//! Single-pass lexer producing spanned tokens.
//!
//! Whitespace and comments are consumed but the "was there space before
//! this token" flag is threaded through, because a tight `(` or `[` after
//! an identifier is a call/subscript while a spaced one opens a plain
//! parenthesised expression. Line comments run to end of line; block
//! comments nest.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{LexerError, LexerErrorKind};

/// A half-open byte span into the source text.
pub type SourceRange = std::ops::Range<usize>;

/// Reserved statement keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Define,
    For,
    If,
    Else,
    Import,
}

/// Binary operators, including the word operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfixOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    In,
    To,
    Step,
}

impl InfixOp {
    /// Every operator spelling, used for "expected an operator" suggestions.
    pub(crate) const ALL: [Self; 16] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulo,
        Self::Less,
        Self::Greater,
        Self::LessEqual,
        Self::GreaterEqual,
        Self::Equal,
        Self::NotEqual,
        Self::And,
        Self::Or,
        Self::In,
        Self::To,
        Self::Step,
    ];

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "in" => Some(Self::In),
            "to" => Some(Self::To),
            "step" => Some(Self::Step),
            _ => None,
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            "%" => Some(Self::Modulo),
            "<" => Some(Self::Less),
            ">" => Some(Self::Greater),
            "<=" => Some(Self::LessEqual),
            ">=" => Some(Self::GreaterEqual),
            "=" => Some(Self::Equal),
            "<>" => Some(Self::NotEqual),
            _ => None,
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::And => "and",
            Self::Or => "or",
            Self::In => "in",
            Self::To => "to",
            Self::Step => "step",
        };
        f.write_str(symbol)
    }
}

/// Unary operators. `not` is never lexed; the parser recognises the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    Plus,
    Minus,
    Not,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "not",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    Linebreak,
    Identifier(String),
    Keyword(Keyword),
    /// Hex digits of a color literal, without the leading `#`.
    HexColor(String),
    Infix(InfixOp),
    Prefix(PrefixOp),
    Number(f64),
    String(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    /// A `(` with no space before it: a function call.
    Call,
    /// A `[` with no space before it: a subscript.
    Subscript,
    Eof,
}

impl TokenKind {
    /// Short human description used in parser errors.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Linebreak => "end of line".to_owned(),
            Self::Identifier(name) => format!("identifier '{name}'"),
            Self::Keyword(keyword) => format!("keyword '{keyword}'"),
            Self::HexColor(digits) => format!("color '#{digits}'"),
            Self::Infix(op) => format!("operator '{op}'"),
            Self::Prefix(op) => format!("operator '{op}'"),
            Self::Number(n) => format!("number '{n}'"),
            Self::String(_) => "string".to_owned(),
            Self::LBrace => "opening brace".to_owned(),
            Self::RBrace => "closing brace".to_owned(),
            Self::LParen | Self::Call => "opening paren".to_owned(),
            Self::RParen => "closing paren".to_owned(),
            Self::LBracket | Self::Subscript => "opening bracket".to_owned(),
            Self::RBracket => "closing bracket".to_owned(),
            Self::Dot => "'.'".to_owned(),
            Self::Eof => "end of file".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: SourceRange,
}

/// The characters operators are munched from. The longest prefix of a run
/// of these that names a known operator wins.
const OPERATOR_CHARS: &str = "+-*/<>=!?&|%^~";

struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes spaces, tabs, and comments. Returns true if anything was
    /// consumed. Does not consume linebreaks.
    fn skip_space(&mut self) -> Result<bool, LexerError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(self.pos > start),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexerError> {
        let start = self.pos;
        self.advance();
        self.advance();
        let mut depth = 1_usize;
        while depth > 0 {
            match self.peek() {
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return Err(LexerError::new(
                        LexerErrorKind::UnexpectedToken(self.source[start..].to_owned()),
                        start..self.source.len(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn scan_identifier(&mut self) -> (String, SourceRange) {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        (self.source[start..self.pos].to_owned(), start..self.pos)
    }

    fn scan_number(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        // A trailing dot is rewound when a letter follows, so `1.foo`
        // lexes as `1 . foo`.
        if seen_dot
            && self.source[start..self.pos].ends_with('.')
            && matches!(self.peek(), Some(c) if c.is_ascii_alphabetic())
        {
            self.pos -= 1;
            seen_dot = false;
        }
        // A second dot followed by a digit makes the whole run invalid
        // rather than a member access on a number literal.
        if seen_dot && self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                self.advance();
            }
            let text = self.source[start..self.pos].to_owned();
            return Err(LexerError::new(LexerErrorKind::InvalidNumber(text), start..self.pos));
        }
        let text = &self.source[start..self.pos];
        let number: f64 = text.parse().map_err(|_| {
            LexerError::new(LexerErrorKind::InvalidNumber(text.to_owned()), start..self.pos)
        })?;
        Ok(Token {
            kind: TokenKind::Number(number),
            range: start..self.pos,
        })
    }

    fn scan_string(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        self.advance();
        let mut string = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexerError::new(LexerErrorKind::UnterminatedString, start..self.pos));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    let escape_start = self.pos;
                    self.advance();
                    match self.advance() {
                        Some('"') => string.push('"'),
                        Some('\\') => string.push('\\'),
                        Some('n') => string.push('\n'),
                        other => {
                            let text = other.map_or_else(|| "\\".to_owned(), |c| format!("\\{c}"));
                            return Err(LexerError::new(
                                LexerErrorKind::InvalidEscape(text),
                                escape_start..self.pos,
                            ));
                        }
                    }
                }
                Some(c) => {
                    string.push(c);
                    self.advance();
                }
            }
        }
        // An unescaped quote pair directly after the string is an error,
        // not a second string literal.
        if self.peek() == Some('"') {
            return Err(LexerError::new(
                LexerErrorKind::UnexpectedToken("\"".to_owned()),
                self.pos..self.pos + 1,
            ));
        }
        Ok(Token {
            kind: TokenKind::String(string),
            range: start..self.pos,
        })
    }

    fn scan_hex_color(&mut self) -> Result<Token, LexerError> {
        let start = self.pos;
        self.advance();
        let digits_start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            self.advance();
        }
        let digits = &self.source[digits_start..self.pos];
        let valid_length = matches!(digits.len(), 3 | 4 | 6 | 8);
        if !valid_length || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LexerError::new(
                LexerErrorKind::InvalidColor(self.source[start..self.pos].to_owned()),
                start..self.pos,
            ));
        }
        Ok(Token {
            kind: TokenKind::HexColor(digits.to_owned()),
            range: start..self.pos,
        })
    }

    fn scan_operator(&mut self, space_before: bool) -> Result<Token, LexerError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if OPERATOR_CHARS.contains(c)) {
            self.advance();
        }
        let run = &self.source[start..self.pos];
        // Longest known prefix wins; the rest is rewound for the next pass.
        let mut length = run.len();
        let (symbol, infix) = loop {
            if length == 0 {
                return Err(LexerError::new(
                    LexerErrorKind::UnexpectedToken(run.to_owned()),
                    start..self.pos,
                ));
            }
            let prefix = &run[..length];
            if let Some(op) = InfixOp::from_symbol(prefix) {
                break (prefix, Some(op));
            }
            if matches!(prefix, "+" | "-") {
                break (prefix, None);
            }
            length -= 1;
        };
        self.pos = start + symbol.len();
        let range = start..self.pos;
        let space_after = matches!(self.peek(), None | Some(' ' | '\t' | '\r' | '\n'));
        let kind = match (symbol, infix) {
            // `+` and `-` are both infix and prefix: no space before but
            // space (or end of line) after reads as infix; anything else
            // with leading space reads as prefix.
            ("+", _) if space_before && !space_after => TokenKind::Prefix(PrefixOp::Plus),
            ("-", _) if space_before && !space_after => TokenKind::Prefix(PrefixOp::Minus),
            ("+", _) => TokenKind::Infix(InfixOp::Add),
            ("-", _) => TokenKind::Infix(InfixOp::Subtract),
            (_, Some(op)) => TokenKind::Infix(op),
            (_, None) => unreachable!("only +/- lack an infix mapping"),
        };
        Ok(Token { kind, range })
    }
}

/// Scans the whole source into a token stream terminated by `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
    let mut scanner = Scanner::new(source);
    let mut tokens: Vec<Token> = Vec::new();
    loop {
        let consumed = scanner.skip_space()?;
        let at_line_start = scanner.pos == 0 || matches!(tokens.last(), Some(t) if t.kind == TokenKind::Linebreak);
        let space_before = consumed || at_line_start;
        let start = scanner.pos;
        let Some(c) = scanner.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                range: start..start,
            });
            break;
        };
        let token = match c {
            '\n' => {
                scanner.advance();
                // Collapse runs of blank lines into a single linebreak.
                loop {
                    scanner.skip_space()?;
                    if !scanner.eat('\n') {
                        break;
                    }
                }
                if matches!(tokens.last(), Some(t) if t.kind == TokenKind::Linebreak) {
                    continue;
                }
                Token {
                    kind: TokenKind::Linebreak,
                    range: start..start + 1,
                }
            }
            '{' => punct(&mut scanner, TokenKind::LBrace),
            '}' => punct(&mut scanner, TokenKind::RBrace),
            '(' => punct(
                &mut scanner,
                if space_before { TokenKind::LParen } else { TokenKind::Call },
            ),
            ')' => punct(&mut scanner, TokenKind::RParen),
            '[' => punct(
                &mut scanner,
                if space_before {
                    TokenKind::LBracket
                } else {
                    TokenKind::Subscript
                },
            ),
            ']' => punct(&mut scanner, TokenKind::RBracket),
            '"' => scanner.scan_string()?,
            '#' => scanner.scan_hex_color()?,
            '.' => {
                let followed = matches!(scanner.peek_at(1), Some(c) if !c.is_whitespace());
                if !space_before && followed {
                    punct(&mut scanner, TokenKind::Dot)
                } else if matches!(scanner.peek_at(1), Some(c) if c.is_ascii_digit()) {
                    scanner.scan_number()?
                } else {
                    scanner.advance();
                    return Err(LexerError::new(
                        LexerErrorKind::UnexpectedToken(".".to_owned()),
                        start..scanner.pos,
                    ));
                }
            }
            c if c.is_ascii_digit() => scanner.scan_number()?,
            c if c.is_ascii_alphabetic() => {
                let (word, range) = scanner.scan_identifier();
                let kind = if let Ok(keyword) = word.parse::<Keyword>() {
                    TokenKind::Keyword(keyword)
                } else if let Some(op) = InfixOp::from_word(&word) {
                    TokenKind::Infix(op)
                } else {
                    TokenKind::Identifier(word)
                };
                Token { kind, range }
            }
            c if OPERATOR_CHARS.contains(c) => scanner.scan_operator(space_before)?,
            other => {
                scanner.advance();
                return Err(LexerError::new(
                    LexerErrorKind::UnexpectedToken(other.to_string()),
                    start..scanner.pos,
                ));
            }
        };
        tokens.push(token);
    }
    retouch_spaced_calls(&mut tokens);
    Ok(tokens)
}

fn punct(scanner: &mut Scanner<'_>, kind: TokenKind) -> Token {
    let start = scanner.pos;
    scanner.advance();
    Token {
        kind,
        range: start..scanner.pos,
    }
}

/// Rewrites `<op> <ident> (` where the paren is spaced so the identifier
/// reads as a function call rather than a value multiplied by a
/// parenthesised expression.
fn retouch_spaced_calls(tokens: &mut [Token]) {
    for i in 2..tokens.len() {
        if tokens[i].kind == TokenKind::LParen
            && matches!(tokens[i - 1].kind, TokenKind::Identifier(_))
            && matches!(tokens[i - 2].kind, TokenKind::Infix(_) | TokenKind::Prefix(_))
        {
            tokens[i].kind = TokenKind::Call;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).expect("lexing failed").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tight_paren_is_call() {
        assert_eq!(
            kinds("foo(1)"),
            vec![
                TokenKind::Identifier("foo".to_owned()),
                TokenKind::Call,
                TokenKind::Number(1.0),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spaced_paren_is_lparen() {
        assert_eq!(
            kinds("foo (1)")[1],
            TokenKind::LParen,
        );
    }

    #[test]
    fn spaced_paren_after_operator_and_identifier_becomes_call() {
        let kinds = kinds("1 * foo (2)");
        assert_eq!(kinds[3], TokenKind::Call);
    }

    #[test]
    fn minus_classification() {
        // space before, none after: prefix
        assert_eq!(kinds("a -1")[1], TokenKind::Prefix(PrefixOp::Minus));
        // space on both sides: infix
        assert_eq!(kinds("a - 1")[1], TokenKind::Infix(InfixOp::Subtract));
        // no space at all: infix
        assert_eq!(kinds("a-1")[1], TokenKind::Infix(InfixOp::Subtract));
    }

    #[test]
    fn maximal_munch_operators() {
        assert_eq!(kinds("a <= b")[1], TokenKind::Infix(InfixOp::LessEqual));
        assert_eq!(kinds("a <> b")[1], TokenKind::Infix(InfixOp::NotEqual));
        assert_eq!(kinds("a < b")[1], TokenKind::Infix(InfixOp::Less));
    }

    #[test]
    fn unknown_operator_errors() {
        let err = tokenize("a ! b").expect_err("expected error");
        assert!(matches!(err.kind, LexerErrorKind::UnexpectedToken(_)));
    }

    #[test]
    fn trailing_dot_rewinds_before_member() {
        assert_eq!(
            kinds("1.foo"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Dot,
                TokenKind::Identifier("foo".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_with_two_dots_is_invalid() {
        let err = tokenize("1.2.3").expect_err("expected error");
        assert!(matches!(err.kind, LexerErrorKind::InvalidNumber(_)));
    }

    #[test]
    fn linebreaks_collapse() {
        assert_eq!(
            kinds("a\n\n\nb"),
            vec![
                TokenKind::Identifier("a".to_owned()),
                TokenKind::Linebreak,
                TokenKind::Identifier("b".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn block_comments_nest() {
        assert_eq!(kinds("a /* x /* y */ z */ b").len(), 3);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\\c\nd""#)[0],
            TokenKind::String("a\"b\\c\nd".to_owned())
        );
        let err = tokenize(r#""a\qb""#).expect_err("expected error");
        assert!(matches!(err.kind, LexerErrorKind::InvalidEscape(_)));
    }

    #[test]
    fn unterminated_string_errors() {
        let err = tokenize("\"abc\ndef").expect_err("expected error");
        assert!(matches!(err.kind, LexerErrorKind::UnterminatedString));
    }

    #[test]
    fn adjacent_quotes_after_string_error() {
        assert!(tokenize(r#""a""b""#).is_err());
    }

    #[test]
    fn hex_color_lengths() {
        assert_eq!(kinds("#fff")[0], TokenKind::HexColor("fff".to_owned()));
        assert_eq!(kinds("#ff00ff88")[0], TokenKind::HexColor("ff00ff88".to_owned()));
        assert!(tokenize("#ff").is_err());
        assert!(tokenize("#ggg").is_err());
    }

    #[test]
    fn word_operators_and_keywords() {
        assert_eq!(kinds("1 to 5 step 2")[1], TokenKind::Infix(InfixOp::To));
        assert_eq!(kinds("1 to 5 step 2")[3], TokenKind::Infix(InfixOp::Step));
        assert_eq!(kinds("define x 1")[0], TokenKind::Keyword(Keyword::Define));
        // `not` stays an identifier; the parser gives it meaning.
        assert_eq!(kinds("not")[0], TokenKind::Identifier("not".to_owned()));
    }

    #[test]
    fn leading_dot_number() {
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
    }

    #[test]
    fn token_ranges_are_half_open_and_increasing() {
        let tokens = tokenize("cube { size 2 }").expect("lexing failed");
        let mut last_end = 0;
        for token in &tokens {
            assert!(token.range.start >= last_end);
            assert!(token.range.end >= token.range.start);
            last_end = token.range.start;
        }
    }
}
