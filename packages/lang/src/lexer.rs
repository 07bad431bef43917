//! Lexer for Lattice source text.

use crate::error::ParseError;
use crate::token::{Span, Token, TokenKind};
use crate::value::Kind;

pub struct Lexer<'a> {
    file: &'a str,
    source: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a str, source: &str) -> Self {
        Self {
            file,
            source: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self, n: usize) -> Option<char> {
        self.source.get(self.pos + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span_here(&self) -> Span {
        Span::new(self.offset, self.line, self.col)
    }

    /// Tokenize the whole input. The result always ends with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current() {
            match ch {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '/' if self.peek(1) == Some('/') => {
                    while !matches!(self.current(), None | Some('\n')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Consume a `//` comment that follows on the same line and return its
    /// text. Only blanks may come between.
    fn trailing_comment(&mut self) -> Option<String> {
        while matches!(self.current(), Some(' ' | '\t')) {
            self.advance();
        }
        if self.current() != Some('/') || self.peek(1) != Some('/') {
            return None;
        }
        self.advance();
        self.advance();

        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
            self.advance();
        }
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let span = self.span_here();

        let Some(ch) = self.current() else {
            return Ok(Token::new(TokenKind::Eof, span));
        };

        if ch == '"' {
            return self.string(span);
        }
        if ch.is_ascii_digit() {
            return self.number(span);
        }
        if is_ident_start(ch) {
            return Ok(self.ident_or_keyword(span));
        }

        self.advance();
        let kind = match ch {
            '\n' => TokenKind::Newline,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '=' => self.with_eq(TokenKind::EqEq, TokenKind::Assign),
            '!' => self.with_eq(TokenKind::NotEq, TokenKind::Bang),
            '<' => self.with_eq(TokenKind::Le, TokenKind::Lt),
            '>' => self.with_eq(TokenKind::Ge, TokenKind::Gt),
            '&' if self.current() == Some('&') => {
                self.advance();
                TokenKind::AndAnd
            }
            '&' => TokenKind::Amp,
            '|' if self.current() == Some('|') => {
                self.advance();
                TokenKind::OrOr
            }
            other => {
                return Err(ParseError::UnexpectedChar {
                    file: self.file.to_string(),
                    ch: other,
                    span,
                })
            }
        };
        Ok(Token::new(kind, span))
    }

    fn with_eq(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.current() == Some('=') {
            self.advance();
            with
        } else {
            without
        }
    }

    fn ident_or_keyword(&mut self, span: Span) -> Token {
        // `_|_` is lexed as a single token.
        if self.current() == Some('_')
            && self.peek(1) == Some('|')
            && self.peek(2) == Some('_')
            && !self.peek(3).is_some_and(is_ident_continue)
        {
            self.advance();
            self.advance();
            self.advance();
            return Token::new(TokenKind::Bottom(self.trailing_comment()), span);
        }

        let mut name = String::new();
        while let Some(ch) = self.current() {
            if !is_ident_continue(ch) {
                break;
            }
            name.push(ch);
            self.advance();
        }

        let kind = match name.as_str() {
            "_" => TokenKind::Top,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "import" => TokenKind::Import,
            "let" => TokenKind::Let,
            other => match Kind::from_keyword(other) {
                Some(k) => TokenKind::KindName(k),
                None => TokenKind::Ident(other.to_string()),
            },
        };
        Token::new(kind, span)
    }

    fn number(&mut self, span: Span) -> Result<Token, ParseError> {
        let mut text = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else if ch == '.' && !is_float && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E')
                && (self.peek(1).is_some_and(|c| c.is_ascii_digit())
                    || (matches!(self.peek(1), Some('+') | Some('-'))
                        && self.peek(2).is_some_and(|c| c.is_ascii_digit())))
            {
                is_float = true;
                text.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() {
                    text.push(sign);
                    self.advance();
                }
            } else {
                break;
            }
        }

        let invalid = || ParseError::InvalidNumber {
            file: self.file.to_string(),
            text: text.clone(),
            span,
        };
        let kind = if is_float {
            TokenKind::Float(text.parse().map_err(|_| invalid())?)
        } else {
            TokenKind::Int(text.parse().map_err(|_| invalid())?)
        };
        Ok(Token::new(kind, span))
    }

    fn string(&mut self, span: Span) -> Result<Token, ParseError> {
        self.advance();
        let mut value = String::new();
        loop {
            let ch = match self.current() {
                None | Some('\n') => {
                    return Err(ParseError::UnterminatedString {
                        file: self.file.to_string(),
                        span,
                    })
                }
                Some(ch) => ch,
            };
            self.advance();
            match ch {
                '"' => break,
                '\\' => value.push(self.escape()?),
                other => value.push(other),
            }
        }
        Ok(Token::new(TokenKind::Str(value), span))
    }

    fn escape(&mut self) -> Result<char, ParseError> {
        let span = self.span_here();
        let file = self.file;
        let invalid = |ch: char| ParseError::InvalidEscape {
            file: file.to_string(),
            ch,
            span,
        };
        let ch = self.advance().ok_or_else(|| ParseError::UnterminatedString {
            file: file.to_string(),
            span,
        })?;
        match ch {
            '"' => Ok('"'),
            '\\' => Ok('\\'),
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'u' => {
                if self.advance() != Some('{') {
                    return Err(invalid('u'));
                }
                let mut hex = String::new();
                while let Some(c) = self.advance() {
                    if c == '}' {
                        break;
                    }
                    hex.push(c);
                }
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid('u'))
            }
            other => Err(invalid(other)),
        }
    }
}

pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$' || ch == '#'
}

pub fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' || ch == '#'
}

/// Whether `name` can be written as a bare label.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_ident_start(first) => {}
        _ => return false,
    }
    chars.all(is_ident_continue)
        && !matches!(
            name,
            "_" | "true" | "false" | "null" | "import" | "let"
        )
        && Kind::from_keyword(name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new("test", src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_field_declaration() {
        assert_eq!(
            kinds("a: 1"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Colon,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_operators() {
        assert_eq!(
            kinds("== != <= >= && || & ! ="),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Amp,
                TokenKind::Bang,
                TokenKind::Assign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_top_bottom_and_kinds() {
        assert_eq!(
            kinds("_ _|_ int _x"),
            vec![
                TokenKind::Top,
                TokenKind::Bottom(None),
                TokenKind::KindName(Kind::Int),
                TokenKind::Ident("_x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn bottom_keeps_trailing_comment() {
        assert_eq!(
            kinds("a: _|_ // conflicting values 1 and 2\nb: 1 // note"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Colon,
                TokenKind::Bottom(Some("conflicting values 1 and 2".to_string())),
                TokenKind::Newline,
                TokenKind::Ident("b".to_string()),
                TokenKind::Colon,
                TokenKind::Int(1),
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("_|_ //  \n")[0], TokenKind::Bottom(None));
        assert_eq!(kinds("[_|_, 1]")[1], TokenKind::Bottom(None));
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(
            kinds("42 1.5 2e3"),
            vec![
                TokenKind::Int(42),
                TokenKind::Float(1.5),
                TokenKind::Float(2000.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_followed_by_selector_dot_is_not_float() {
        assert_eq!(
            kinds("1.a"),
            vec![
                TokenKind::Int(1),
                TokenKind::Dot,
                TokenKind::Ident("a".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_escapes() {
        assert_eq!(
            kinds(r#""a\"b\n\u{41}""#),
            vec![TokenKind::Str("a\"b\nA".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn skips_comments_but_keeps_newlines() {
        assert_eq!(
            kinds("a // note\nb"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Newline,
                TokenKind::Ident("b".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_error() {
        let err = Lexer::new("test", "\"abc").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { .. }));
    }

    #[test]
    fn single_pipe_is_error() {
        let err = Lexer::new("test", "a | b").tokenize().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedChar { ch: '|', .. }));
    }

    #[test]
    fn integer_overflow_is_error() {
        let err = Lexer::new("test", "99999999999999999999")
            .tokenize()
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidNumber { .. }));
    }

    #[test]
    fn identifier_check() {
        assert!(is_identifier("abc"));
        assert!(is_identifier("#Def"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier("1a"));
        assert!(!is_identifier("int"));
        assert!(!is_identifier(""));
    }
}
