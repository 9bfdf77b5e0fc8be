//! Expression grammar: precedence climbing from `||` down to postfix
//! call/member/index chains and primaries.

use crate::lexer::{TokenKind, Token};

use super::ast::{
    BinaryExpr, CallExpr, DictExpr, Expression, FuncExpr, GetExpr, IndexExpr, ListExpr,
    LiteralExpr, StructLiteralExpr, TypeExpr, UnaryExpr, VariableExpr,
};
use super::{ParseError, ParseResult, Parser};

impl Parser {
    pub(crate) fn expression(&mut self) -> ParseResult<Expression> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.and_expr()?;
        while let Some(operator) = self.matches(&[TokenKind::Or])? {
            self.skip_newlines()?;
            let right = self.and_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.equality_expr()?;
        while let Some(operator) = self.matches(&[TokenKind::And])? {
            self.skip_newlines()?;
            let right = self.equality_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn equality_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.comparison_expr()?;
        while let Some(operator) = self.matches(&[TokenKind::Equal, TokenKind::NotEqual])? {
            self.skip_newlines()?;
            let right = self.comparison_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn comparison_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.term_expr()?;
        while let Some(operator) = self.matches(&[
            TokenKind::Less,
            TokenKind::LessEqual,
            TokenKind::Greater,
            TokenKind::GreaterEqual,
        ])? {
            self.skip_newlines()?;
            let right = self.term_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn term_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.factor_expr()?;
        while let Some(operator) = self.matches(&[TokenKind::Plus, TokenKind::Minus])? {
            self.skip_newlines()?;
            let right = self.factor_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn factor_expr(&mut self) -> ParseResult<Expression> {
        let mut left = self.unary_expr()?;
        while let Some(operator) =
            self.matches(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent])?
        {
            self.skip_newlines()?;
            let right = self.unary_expr()?;
            left = binary(left, operator, right);
        }
        Ok(left)
    }

    fn unary_expr(&mut self) -> ParseResult<Expression> {
        if let Some(operator) = self.matches(&[TokenKind::Minus, TokenKind::Bang])? {
            let right = self.unary_expr()?;
            return Ok(Expression::Unary(Box::new(UnaryExpr { operator, right })));
        }
        self.call_expr()
    }

    /// Postfix chains: calls, member access, indexing and generic
    /// instantiation, applied left to right.
    fn call_expr(&mut self) -> ParseResult<Expression> {
        let mut expr = self.primary_expr()?;

        loop {
            if self.check(TokenKind::LParen)? {
                let span = self.advance()?.span;
                expr = self.finish_call(expr, vec![], span)?;
            } else if self.check(TokenKind::Dot)? {
                let span = self.advance()?.span;
                let name = self.consume(TokenKind::Identifier, "expected property name after '.'")?;
                expr = Expression::Get(Box::new(GetExpr {
                    object: expr,
                    name: name.lexeme,
                    span,
                }));
            } else if self.check(TokenKind::LBracket)? {
                // `expr[T, ...](...)` is a generic call; anything else is
                // indexing. Decided by a speculative type-argument parse.
                if let Some(type_args) = self.try_generic_call_arguments()? {
                    let span = self.consume(TokenKind::LParen, "expected '(' after type arguments")?
                        .span;
                    expr = self.finish_call(expr, type_args, span)?;
                    continue;
                }
                let span = self.advance()?.span;
                self.skip_newlines()?;
                let index =
                    self.with_struct_literals(|parser| parser.expression())?;
                self.skip_newlines()?;
                self.consume(TokenKind::RBracket, "expected ']' after index")?;
                expr = Expression::Index(Box::new(IndexExpr {
                    collection: expr,
                    index,
                    span,
                }));
            } else {
                return Ok(expr);
            }
        }
    }

    /// Probe for `[Type, ...]` immediately followed by `(`. Rewinds and
    /// returns `None` when the brackets do not hold a type-argument list
    /// for a call.
    fn try_generic_call_arguments(&mut self) -> ParseResult<Option<Vec<TypeExpr>>> {
        let mark = self.mark();
        match self.type_argument_list() {
            Ok(args) => {
                if self.check(TokenKind::LParen)? {
                    return Ok(Some(args));
                }
                self.rewind(mark);
                Ok(None)
            }
            Err(err @ ParseError::Incomplete(_)) => Err(err),
            Err(_) => {
                self.rewind(mark);
                Ok(None)
            }
        }
    }

    fn finish_call(
        &mut self,
        callee: Expression,
        type_args: Vec<TypeExpr>,
        span: crate::lexer::Span,
    ) -> ParseResult<Expression> {
        let mut arguments = vec![];
        self.skip_newlines()?;
        if !self.check(TokenKind::RParen)? {
            loop {
                arguments.push(self.with_struct_literals(|parser| parser.expression())?);
                self.skip_newlines()?;
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume(TokenKind::RParen, "expected ')' after arguments")?;
        Ok(Expression::Call(Box::new(CallExpr {
            callee,
            type_args,
            arguments,
            span,
        })))
    }

    fn primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::False
            | TokenKind::True
            | TokenKind::Nil
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::Str => {
                let value = self.advance()?;
                Ok(Expression::Literal(LiteralExpr { value }))
            }
            TokenKind::Identifier => self.identifier_expr(),
            TokenKind::LParen => {
                self.advance()?;
                self.skip_newlines()?;
                let expr = self.with_struct_literals(|parser| parser.expression())?;
                self.skip_newlines()?;
                self.consume(TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.list_literal(),
            TokenKind::LBrace => self.dict_literal(),
            TokenKind::Func => self.func_expression(),
            TokenKind::Eof => Err(ParseError::Incomplete("expression".to_string())),
            _ => Err(self.unexpected(&token, "unexpected token in expression")),
        }
    }

    /// An identifier in expression position: a plain variable reference,
    /// a struct literal `Name{...}`, a generic struct literal
    /// `Name[T]{...}`, or the start of a generic call `name[T](...)`.
    fn identifier_expr(&mut self) -> ParseResult<Expression> {
        let name = self.advance()?;

        if self.check(TokenKind::LBracket)? {
            let mark = self.mark();
            if let Ok(args) = self.type_argument_list() {
                if self.check(TokenKind::LBrace)? && self.struct_literals_allowed() {
                    let type_expr = TypeExpr {
                        name: name.lexeme,
                        args,
                        span: name.span,
                    };
                    return self.struct_literal(type_expr);
                }
                if self.check(TokenKind::LParen)? {
                    let span = self.advance()?.span;
                    let callee = Expression::Variable(VariableExpr {
                        name: name.lexeme,
                        span: name.span,
                    });
                    return self.finish_call(callee, args, span);
                }
            }
            self.rewind(mark);
        } else if self.check(TokenKind::LBrace)? && self.struct_literals_allowed() {
            let type_expr = TypeExpr::new(&name.lexeme, name.span);
            return self.struct_literal(type_expr);
        }

        Ok(Expression::Variable(VariableExpr {
            name: name.lexeme,
            span: name.span,
        }))
    }

    fn list_literal(&mut self) -> ParseResult<Expression> {
        let span = self.advance()?.span;
        let mut elements = vec![];
        self.skip_newlines()?;
        if !self.check(TokenKind::RBracket)? {
            loop {
                elements.push(self.with_struct_literals(|parser| parser.expression())?);
                self.skip_newlines()?;
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume(TokenKind::RBracket, "expected ']' after list elements")?;
        Ok(Expression::List(ListExpr { elements, span }))
    }

    fn dict_literal(&mut self) -> ParseResult<Expression> {
        let span = self.advance()?.span;
        let mut pairs = vec![];
        self.skip_newlines()?;
        if !self.check(TokenKind::RBrace)? {
            loop {
                let key = self.with_struct_literals(|parser| parser.expression())?;
                self.consume(TokenKind::Colon, "expected ':' after dictionary key")?;
                let value = self.with_struct_literals(|parser| parser.expression())?;
                pairs.push((key, value));
                self.skip_newlines()?;
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume(TokenKind::RBrace, "expected '}' after dictionary entries")?;
        Ok(Expression::Dict(DictExpr { pairs, span }))
    }

    /// `Name{field: expr, ...}`; the current token is the `{`.
    fn struct_literal(&mut self, type_expr: TypeExpr) -> ParseResult<Expression> {
        let span = self.advance()?.span;
        let mut fields = vec![];
        self.skip_newlines()?;
        if !self.check(TokenKind::RBrace)? {
            loop {
                let name = self.consume(TokenKind::Identifier, "expected field name")?;
                self.consume(TokenKind::Colon, "expected ':' after field name")?;
                let value = self.with_struct_literals(|parser| parser.expression())?;
                fields.push((name.lexeme, value));
                self.skip_newlines()?;
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume(TokenKind::RBrace, "expected '}' after struct fields")?;
        Ok(Expression::StructLiteral(StructLiteralExpr {
            type_expr,
            fields,
            span,
        }))
    }

    /// Anonymous `func (params) { body }` expression.
    fn func_expression(&mut self) -> ParseResult<Expression> {
        let span = self.advance()?.span;
        self.consume(TokenKind::LParen, "expected '(' after 'func' in function literal")?;
        let params = self.parameter_list()?;
        let lbrace = self.consume(TokenKind::LBrace, "expected '{' before function body")?;
        let body = self.with_struct_literals(|parser| parser.block_statement(lbrace.span))?;
        Ok(Expression::Func(FuncExpr { params, body, span }))
    }

    // type expressions ----------------------------------------------------

    /// `Name` or `Name[Args, ...]`. Builtin type names (including `func`)
    /// arrive as plain identifiers except for the `func` keyword itself.
    pub(crate) fn type_expr(&mut self) -> ParseResult<TypeExpr> {
        let token = self.peek()?;
        let name = match token.kind {
            TokenKind::Identifier | TokenKind::Func => self.advance()?,
            TokenKind::Eof => return Err(ParseError::Incomplete("type".to_string())),
            _ => return Err(self.unexpected(&token, "expected type name")),
        };

        let mut type_expr = TypeExpr::new(&name.lexeme, name.span);
        if self.check(TokenKind::LBracket)? {
            type_expr.args = self.type_argument_list()?;
        }
        Ok(type_expr)
    }

    /// `[T1, T2, ...]`; the current token is the `[`.
    pub(crate) fn type_argument_list(&mut self) -> ParseResult<Vec<TypeExpr>> {
        self.consume(TokenKind::LBracket, "expected '[' before type arguments")?;
        let mut args = vec![];
        loop {
            args.push(self.type_expr()?);
            if self.matches(&[TokenKind::Comma])?.is_none() {
                break;
            }
        }
        self.consume(TokenKind::RBracket, "expected ']' after type arguments")?;
        Ok(args)
    }

    pub(crate) fn parameter_list(&mut self) -> ParseResult<Vec<super::ast::Param>> {
        let mut params = vec![];
        self.skip_newlines()?;
        if !self.check(TokenKind::RParen)? {
            loop {
                let name = self.consume(TokenKind::Identifier, "expected parameter name")?;
                self.consume(TokenKind::Colon, "expected ':' after parameter name")?;
                let type_expr = self.type_expr()?;
                params.push(super::ast::Param {
                    name: super::ast::Ident {
                        name: name.lexeme,
                        span: name.span,
                    },
                    type_expr,
                });
                self.skip_newlines()?;
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume(TokenKind::RParen, "expected ')' after parameters")?;
        Ok(params)
    }
}

fn binary(left: Expression, operator: Token, right: Expression) -> Expression {
    Expression::Binary(Box::new(BinaryExpr {
        left,
        operator,
        right,
    }))
}
