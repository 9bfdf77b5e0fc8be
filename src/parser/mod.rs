//! Parsing for Rill.
//!
//! The parser pulls tokens on demand from the streaming lexer and produces
//! a list of statements. Its two failure modes are kept apart so an
//! interactive driver can react to them differently:
//!
//! - [`ParseError::Incomplete`]: the token stream ran out inside an open
//!   construct (unclosed brace, dangling operator, ...). The driver should
//!   read more input and retry the whole submission.
//! - [`ParseError::Syntax`]: anything else, reported with the position of
//!   the offending token.

pub mod ast;

mod expressions;
mod statements;

use std::{error::Error, fmt::Display};

use log::trace;

use crate::lexer::{LexError, Lexer, Span, Token, TokenKind};

use self::ast::Statement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// More input is needed to finish the named construct.
    Incomplete(String),
    /// The input is syntactically invalid.
    Syntax { message: String, span: Span },
}

impl ParseError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete(_))
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Incomplete(construct) => {
                write!(f, "incomplete input while parsing {construct}")
            }
            ParseError::Syntax { message, span } => write!(f, "{message} (at {span})"),
        }
    }
}

impl Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Syntax {
            message: err.message,
            span: err.span,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Token buffer filled lazily from the lexer. Tokens past the EOF token
/// are never requested from the lexer; reads beyond it keep returning it.
struct TokenStream {
    lexer: Lexer,
    tokens: Vec<Token>,
}

impl TokenStream {
    fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            tokens: vec![],
        }
    }

    fn get(&mut self, index: usize) -> ParseResult<&Token> {
        while self.tokens.len() <= index {
            if let Some(last) = self.tokens.last() {
                if last.kind == TokenKind::Eof {
                    break;
                }
            }
            let token = self.lexer.next_token()?;
            trace!("lexed {:?} at {}", token.kind, token.span);
            self.tokens.push(token);
        }
        // reads past the end clamp to the EOF token
        let index = index.min(self.tokens.len() - 1);
        Ok(&self.tokens[index])
    }
}

pub struct Parser {
    stream: TokenStream,
    current: usize,
    /// `Name {` parses as a struct literal only where this is set; it is
    /// cleared inside `if`/`while`/`for` headers and restored inside any
    /// parenthesised or bracketed subexpression.
    struct_literals_allowed: bool,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            stream: TokenStream::new(Lexer::new(input)),
            current: 0,
            struct_literals_allowed: true,
        }
    }

    /// Parse a whole submission into a statement list.
    pub fn parse(mut self) -> ParseResult<Vec<Statement>> {
        let mut statements = vec![];
        loop {
            self.skip_newlines()?;
            if self.check(TokenKind::Eof)? {
                return Ok(statements);
            }
            statements.push(self.statement()?);
        }
    }

    // token plumbing ------------------------------------------------------

    pub(crate) fn peek(&mut self) -> ParseResult<Token> {
        let current = self.current;
        self.stream.get(current).cloned()
    }

    pub(crate) fn peek_kind(&mut self) -> ParseResult<TokenKind> {
        Ok(self.peek()?.kind)
    }

    pub(crate) fn check(&mut self, kind: TokenKind) -> ParseResult<bool> {
        Ok(self.peek_kind()? == kind)
    }

    pub(crate) fn check_next(&mut self, kind: TokenKind) -> ParseResult<bool> {
        let next = self.current + 1;
        Ok(self.stream.get(next)?.kind == kind)
    }

    pub(crate) fn advance(&mut self) -> ParseResult<Token> {
        let token = self.peek()?;
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        Ok(token)
    }

    /// Consume the current token if it has one of the given kinds.
    pub(crate) fn matches(&mut self, kinds: &[TokenKind]) -> ParseResult<Option<Token>> {
        let token = self.peek()?;
        if kinds.contains(&token.kind) {
            self.advance()?;
            return Ok(Some(token));
        }
        Ok(None)
    }

    /// Require a token of the given kind. Hitting EOF instead reports the
    /// submission as incomplete; any other mismatch is a syntax error.
    pub(crate) fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        let token = self.peek()?;
        if token.kind == kind {
            return self.advance();
        }
        if token.kind == TokenKind::Eof {
            return Err(ParseError::Incomplete(message.to_string()));
        }
        Err(self.unexpected(&token, message))
    }

    pub(crate) fn unexpected(&self, token: &Token, message: &str) -> ParseError {
        if token.kind == TokenKind::Illegal {
            return ParseError::Syntax {
                message: format!("unrecognised character '{}'", token.lexeme),
                span: token.span,
            };
        }
        ParseError::Syntax {
            message: format!("{message}, got {token}"),
            span: token.span,
        }
    }

    pub(crate) fn skip_newlines(&mut self) -> ParseResult<()> {
        while self.check(TokenKind::Newline)? {
            self.advance()?;
        }
        Ok(())
    }

    /// Statements end at a newline, a closing brace, the end of input, or
    /// simply where the next statement begins (several statements may
    /// share a line). At most one newline is consumed here; runs of blank
    /// lines are skipped at statement boundaries instead.
    pub(crate) fn consume_statement_end(&mut self) -> ParseResult<()> {
        if self.check(TokenKind::Newline)? {
            self.advance()?;
        }
        Ok(())
    }

    // speculative parsing -------------------------------------------------

    pub(crate) fn mark(&self) -> usize {
        self.current
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        self.current = mark;
    }

    // struct literal context ----------------------------------------------

    pub(crate) fn without_struct_literals<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let previous = std::mem::replace(&mut self.struct_literals_allowed, false);
        let result = f(self);
        self.struct_literals_allowed = previous;
        result
    }

    pub(crate) fn with_struct_literals<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let previous = std::mem::replace(&mut self.struct_literals_allowed, true);
        let result = f(self);
        self.struct_literals_allowed = previous;
        result
    }

    pub(crate) fn struct_literals_allowed(&self) -> bool {
        self.struct_literals_allowed
    }
}

/// Convenience wrapper: lex and parse a full source fragment.
pub fn parse(input: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), vec![]);
        assert_eq!(parse("\n\n\n").unwrap(), vec![]);
    }

    #[test]
    fn test_incomplete_block() {
        let err = parse("while true {").unwrap_err();
        assert!(err.is_incomplete(), "expected incomplete, got {err:?}");
    }

    #[test]
    fn test_incomplete_trailing_operator() {
        let err = parse("1 +").unwrap_err();
        assert!(err.is_incomplete(), "expected incomplete, got {err:?}");
    }

    #[test]
    fn test_incomplete_open_paren() {
        let err = parse("print(1 + 2").unwrap_err();
        assert!(err.is_incomplete(), "expected incomplete, got {err:?}");
    }

    #[test]
    fn test_syntax_error_is_not_incomplete() {
        let err = parse("var = 3").unwrap_err();
        assert!(!err.is_incomplete(), "expected syntax error, got {err:?}");
    }

    #[test]
    fn test_illegal_character_is_fatal() {
        let err = parse("1 @ 2").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }
}
