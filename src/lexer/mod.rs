//! Lexical analysis for Rill source text.
//!
//! The lexer is a pull API: [`Lexer::next_token`] produces one token per
//! call, scanning the input on demand. It never buffers more than the
//! token it is currently producing, so a driver can hand it incrementally
//! grown source without paying for a full re-scan of anything already
//! consumed by the parser's own buffer.

mod token;

pub use token::*;

use std::collections::HashMap;
use std::{error::Error, fmt::Display};

use once_cell::sync::Lazy;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("nil", TokenKind::Nil),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("for", TokenKind::For),
        ("in", TokenKind::In),
        ("while", TokenKind::While),
        ("var", TokenKind::Var),
        ("func", TokenKind::Func),
        ("return", TokenKind::Return),
        ("struct", TokenKind::Struct),
        ("type", TokenKind::Type),
        ("import", TokenKind::Import),
        ("as", TokenKind::As),
        ("print", TokenKind::Print),
        ("break", TokenKind::Break),
        ("continue", TokenKind::Continue),
    ])
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    fn new(message: impl ToString, span: Span) -> Self {
        Self {
            message: message.to_string(),
            span,
        }
    }
}

impl Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at {})", self.message, self.span)
    }
}

impl Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug, Clone)]
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn lexeme_since(&self, start: usize) -> String {
        self.chars[start..self.pos].iter().collect()
    }

    /// Produce the next token. Once the input is exhausted, every further
    /// call yields an EOF token.
    pub fn next_token(&mut self) -> LexResult<Token> {
        loop {
            match self.peek() {
                None => return Ok(Token::new(TokenKind::Eof, "", self.span())),
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    let span = self.span();
                    self.advance();
                    return Ok(Token::new(TokenKind::Newline, "\n", span));
                }
                Some('/') if self.peek_next() == Some('/') => {
                    if let Some(newline) = self.line_comment() {
                        return Ok(newline);
                    }
                    // comment ran to end of input; loop round to EOF
                }
                Some('/') if self.peek_next() == Some('*') => {
                    self.block_comment()?;
                }
                Some('"') | Some('\'') => return self.string(),
                Some(c) if c.is_ascii_digit() => return self.number(),
                Some(c) if c.is_alphabetic() || c == '_' => return Ok(self.identifier()),
                Some(_) => return Ok(self.operator()),
            }
        }
    }

    /// Pull tokens until EOF, returning the whole stream (EOF included).
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = vec![];
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Consume a `//` comment through the end of the line, inclusive.
    /// Returns the newline token the comment swallowed, if any.
    fn line_comment(&mut self) -> Option<Token> {
        while let Some(c) = self.peek() {
            if c == '\n' {
                let span = self.span();
                self.advance();
                return Some(Token::new(TokenKind::Newline, "\n", span));
            }
            self.advance();
        }
        None
    }

    fn block_comment(&mut self) -> LexResult<()> {
        let start = self.span();
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    return Err(LexError::new("unterminated block comment", start));
                }
                Some('*') if self.peek_next() == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn string(&mut self) -> LexResult<Token> {
        let span = self.span();
        let start = self.pos;
        let quote = self.advance().unwrap_or('"');
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(LexError::new("unterminated string literal", span)),
                Some('\\') => {
                    let Some(escaped) = self.advance() else {
                        return Err(LexError::new("unterminated string literal", span));
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        '\\' => value.push('\\'),
                        '"' => value.push('"'),
                        '\'' => value.push('\''),
                        other => value.push(other),
                    }
                }
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }

        Ok(Token::with_literal(
            TokenKind::Str,
            self.lexeme_since(start),
            Literal::Str(value),
            span,
        ))
    }

    fn number(&mut self) -> LexResult<Token> {
        let span = self.span();
        let start = self.pos;

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        let is_float = self.peek() == Some('.')
            && matches!(self.peek_next(), Some(c) if c.is_ascii_digit());
        if is_float {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let lexeme = self.lexeme_since(start);
        if is_float {
            let value = lexeme
                .parse::<f64>()
                .map_err(|_| LexError::new(format!("invalid float literal '{lexeme}'"), span))?;
            Ok(Token::with_literal(
                TokenKind::Float,
                lexeme,
                Literal::Float(value),
                span,
            ))
        } else {
            let value = lexeme
                .parse::<i64>()
                .map_err(|_| LexError::new(format!("invalid integer literal '{lexeme}'"), span))?;
            Ok(Token::with_literal(
                TokenKind::Integer,
                lexeme,
                Literal::Int(value),
                span,
            ))
        }
    }

    fn identifier(&mut self) -> Token {
        let span = self.span();
        let start = self.pos;

        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let lexeme = self.lexeme_since(start);
        let kind = KEYWORDS
            .get(lexeme.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, span)
    }

    /// Longest-match scan for punctuation and operator tokens. Anything
    /// unrecognised becomes an `Illegal` token, which the parser treats
    /// as fatal.
    fn operator(&mut self) -> Token {
        let span = self.span();
        let start = self.pos;
        let c = self.advance().unwrap_or('\0');

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            ':' => self.two('=', TokenKind::ColonAssign, TokenKind::Colon),
            '=' => self.two('=', TokenKind::Equal, TokenKind::Assign),
            '!' => self.two('=', TokenKind::NotEqual, TokenKind::Bang),
            '<' => self.two('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.two('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '-' => self.two('>', TokenKind::Arrow, TokenKind::Minus),
            '&' => self.two('&', TokenKind::And, TokenKind::Ampersand),
            '|' => self.two('|', TokenKind::Or, TokenKind::Pipe),
            _ => TokenKind::Illegal,
        };

        Token::new(kind, self.lexeme_since(start), span)
    }

    fn two(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lex_identifier() {
        let tokens = Lexer::new("letter").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "letter");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_lex_keywords() {
        assert_eq!(
            kinds("var func struct return"),
            vec![
                TokenKind::Var,
                TokenKind::Func,
                TokenKind::Struct,
                TokenKind::Return,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_integer() {
        let tokens = Lexer::new("1337").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].literal, Some(Literal::Int(1337)));
    }

    #[test]
    fn test_lex_float() {
        let tokens = Lexer::new("3.25").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].literal, Some(Literal::Float(3.25)));
    }

    #[test]
    fn test_integer_followed_by_dot_is_not_a_float() {
        assert_eq!(
            kinds("1.foo"),
            vec![
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_var_declaration() {
        assert_eq!(
            kinds("var foo = 42\n"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_longest_match_operators() {
        assert_eq!(
            kinds(":= == != <= >= -> && || & |"),
            vec![
                TokenKind::ColonAssign,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Arrow,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = Lexer::new(r#""a\tb\n\q""#).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\tb\nq".into())));
    }

    #[test]
    fn test_single_quoted_string() {
        let tokens = Lexer::new("'hi \"there\"'").tokenize().unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Str("hi \"there\"".into())));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(Lexer::new("\"oops").tokenize().is_err());
    }

    #[test]
    fn test_line_comment_swallows_newline() {
        assert_eq!(
            kinds("1 // comment\n2"),
            vec![
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(
            kinds("1 /* a\nb */ 2"),
            vec![TokenKind::Integer, TokenKind::Integer, TokenKind::Eof]
        );
        let tokens = Lexer::new("1 /* a\nb */ 2").tokenize().unwrap();
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn test_positions() {
        let tokens = Lexer::new("ab cd\nef").tokenize().unwrap();
        let positions = tokens
            .iter()
            .map(|t| (t.span.line, t.span.column))
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![(1, 0), (1, 3), (1, 5), (2, 0), (2, 2)]);
    }

    #[test]
    fn test_illegal_character() {
        let tokens = Lexer::new("@").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
    }

    #[test]
    fn test_stream_ends_with_single_eof() {
        let tokens = Lexer::new("x y z").tokenize().unwrap();
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }
}
