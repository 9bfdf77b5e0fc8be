//! Statement grammar: declarations, control flow and the statement
//! dispatch itself.

use crate::lexer::{Span, TokenKind};

use super::ast::{
    AssignStmt, BlockStmt, BreakStmt, ContinueStmt, ExprStmt, FieldDecl, ForStmt, FuncStmt, Ident,
    IfStmt, PrintStmt, ReturnStmt, ShortVarStmt, Statement, StructStmt, TypeExpr, VarStmt,
    WhileStmt,
};
use super::{ParseError, ParseResult, Parser};

impl Parser {
    /// Dispatch on the current token. Order matters: several statement
    /// forms start with an identifier and are told apart by the token
    /// after it.
    pub(crate) fn statement(&mut self) -> ParseResult<Statement> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Var => {
                self.advance()?;
                let stmt = self.var_declaration(token.span)?;
                self.consume_statement_end()?;
                Ok(stmt)
            }
            TokenKind::Struct => self.struct_declaration(),
            TokenKind::Identifier => {
                if self.check_next(TokenKind::ColonAssign)? {
                    let stmt = self.short_var_declaration()?;
                    self.consume_statement_end()?;
                    return Ok(stmt);
                }
                if self.check_next(TokenKind::Assign)? {
                    let stmt = self.assignment()?;
                    self.consume_statement_end()?;
                    return Ok(stmt);
                }
                self.expression_statement()
            }
            TokenKind::Print => self.print_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Func => {
                // `func name(...)` declares; a bare `func (...)` literal
                // falls through to the expression grammar.
                if self.check_next(TokenKind::Identifier)? {
                    self.advance()?;
                    let stmt = self.func_declaration(token.span)?;
                    Ok(Statement::Func(stmt))
                } else {
                    self.expression_statement()
                }
            }
            TokenKind::Return => self.return_statement(),
            TokenKind::Break => {
                self.advance()?;
                self.consume_statement_end()?;
                Ok(Statement::Break(BreakStmt { span: token.span }))
            }
            TokenKind::Continue => {
                self.advance()?;
                self.consume_statement_end()?;
                Ok(Statement::Continue(ContinueStmt { span: token.span }))
            }
            TokenKind::LBrace => {
                self.advance()?;
                let block = self.block_statement(token.span)?;
                Ok(Statement::Block(block))
            }
            TokenKind::Import | TokenKind::Type | TokenKind::As => Err(self.unexpected(
                &token,
                "reserved keyword is not supported in a statement",
            )),
            _ => self.expression_statement(),
        }
    }

    /// `var a = expr`, `var a: Type = expr`, `var a, b, c = expr`.
    /// The leading `var` has already been consumed; the statement end has
    /// not (so the same routine serves `for` init clauses).
    pub(crate) fn var_declaration(&mut self, span: Span) -> ParseResult<Statement> {
        let mut names = vec![];
        loop {
            let name = self.consume(TokenKind::Identifier, "expected variable name after 'var'")?;
            names.push(Ident {
                name: name.lexeme,
                span: name.span,
            });
            if self.matches(&[TokenKind::Comma])?.is_none() {
                break;
            }
        }

        let mut type_expr = None;
        if self.check(TokenKind::Colon)? {
            let colon = self.advance()?;
            if names.len() > 1 {
                return Err(ParseError::Syntax {
                    message: "a type annotation is only allowed for a single variable".to_string(),
                    span: colon.span,
                });
            }
            type_expr = Some(self.type_expr()?);
        }

        self.consume(TokenKind::Assign, "expected '=' in variable declaration")?;
        let init = self.expression()?;

        Ok(Statement::Var(VarStmt {
            names,
            type_expr,
            init,
            span,
        }))
    }

    /// `name := expr`, detected by two-token lookahead.
    pub(crate) fn short_var_declaration(&mut self) -> ParseResult<Statement> {
        let name = self.consume(TokenKind::Identifier, "expected variable name before ':='")?;
        self.consume(TokenKind::ColonAssign, "expected ':='")?;
        let init = self.expression()?;
        Ok(Statement::ShortVar(ShortVarStmt {
            name: Ident {
                name: name.lexeme,
                span: name.span,
            },
            init,
        }))
    }

    /// `name = expr`, detected by two-token lookahead.
    pub(crate) fn assignment(&mut self) -> ParseResult<Statement> {
        let name = self.consume(TokenKind::Identifier, "expected variable name before '='")?;
        self.consume(TokenKind::Assign, "expected '='")?;
        let value = self.expression()?;
        Ok(Statement::Assign(AssignStmt {
            name: Ident {
                name: name.lexeme,
                span: name.span,
            },
            value,
        }))
    }

    fn print_statement(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;
        let expr = self.expression()?;
        self.consume_statement_end()?;
        Ok(Statement::Print(PrintStmt { expr, span }))
    }

    fn expression_statement(&mut self) -> ParseResult<Statement> {
        let expr = self.expression()?;
        self.consume_statement_end()?;
        Ok(Statement::Expression(ExprStmt { expr }))
    }

    fn if_statement(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;
        let condition = self.without_struct_literals(|parser| parser.expression())?;

        let lbrace = self.consume(TokenKind::LBrace, "expected '{' after if condition")?;
        let then_branch = self.block_statement(lbrace.span)?;

        let mut else_branch = None;
        if self.matches(&[TokenKind::Else])?.is_some() {
            let lbrace = self.consume(TokenKind::LBrace, "expected '{' after 'else'")?;
            else_branch = Some(self.block_statement(lbrace.span)?);
        }
        self.consume_statement_end()?;

        Ok(Statement::If(Box::new(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        })))
    }

    fn while_statement(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;
        let condition = self.without_struct_literals(|parser| parser.expression())?;
        let lbrace = self.consume(TokenKind::LBrace, "expected '{' after while condition")?;
        let body = self.block_statement(lbrace.span)?;
        self.consume_statement_end()?;
        Ok(Statement::While(Box::new(WhileStmt {
            condition,
            body,
            span,
        })))
    }

    /// `for init; cond; update { ... }` with every clause optional.
    fn for_statement(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;

        let (init, condition, update) = self.without_struct_literals(|parser| {
            let init = parser.for_init_clause()?;
            parser.consume(TokenKind::Semicolon, "expected ';' after for init clause")?;

            let mut condition = None;
            if !parser.check(TokenKind::Semicolon)? {
                condition = Some(parser.expression()?);
            }
            parser.consume(TokenKind::Semicolon, "expected ';' after for condition")?;

            let update = parser.for_update_clause()?;
            Ok((init, condition, update))
        })?;

        let lbrace = self.consume(TokenKind::LBrace, "expected '{' after for clauses")?;
        let body = self.block_statement(lbrace.span)?;
        self.consume_statement_end()?;

        Ok(Statement::For(Box::new(ForStmt {
            init,
            condition,
            update,
            body,
            span,
        })))
    }

    fn for_init_clause(&mut self) -> ParseResult<Option<Box<Statement>>> {
        if self.check(TokenKind::Semicolon)? {
            return Ok(None);
        }
        let token = self.peek()?;
        let stmt = if token.kind == TokenKind::Var {
            self.advance()?;
            self.var_declaration(token.span)?
        } else if token.kind == TokenKind::Identifier && self.check_next(TokenKind::ColonAssign)? {
            self.short_var_declaration()?
        } else if token.kind == TokenKind::Identifier && self.check_next(TokenKind::Assign)? {
            self.assignment()?
        } else {
            return Err(self.unexpected(&token, "expected declaration or assignment in for init"));
        };
        Ok(Some(Box::new(stmt)))
    }

    fn for_update_clause(&mut self) -> ParseResult<Option<Box<Statement>>> {
        if self.check(TokenKind::LBrace)? {
            return Ok(None);
        }
        let token = self.peek()?;
        let stmt = if token.kind == TokenKind::Identifier && self.check_next(TokenKind::ColonAssign)?
        {
            self.short_var_declaration()?
        } else if token.kind == TokenKind::Identifier && self.check_next(TokenKind::Assign)? {
            self.assignment()?
        } else {
            return Err(self.unexpected(&token, "expected assignment in for update clause"));
        };
        Ok(Some(Box::new(stmt)))
    }

    /// `func name[T, ...](params) -> Ret { ... }`. The `func` keyword has
    /// already been consumed. Also used for methods in struct bodies.
    pub(crate) fn func_declaration(&mut self, span: Span) -> ParseResult<FuncStmt> {
        let name = self.consume(TokenKind::Identifier, "expected function name after 'func'")?;

        let mut type_params = vec![];
        if self.check(TokenKind::LBracket)? {
            self.advance()?;
            loop {
                let param =
                    self.consume(TokenKind::Identifier, "expected type parameter name")?;
                type_params.push(Ident {
                    name: param.lexeme,
                    span: param.span,
                });
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
            }
            self.consume(TokenKind::RBracket, "expected ']' after type parameters")?;
        }

        self.consume(TokenKind::LParen, "expected '(' after function name")?;
        let params = self.parameter_list()?;

        let returns = self.return_clause()?;

        let lbrace = self.consume(TokenKind::LBrace, "expected '{' before function body")?;
        let body = self.with_struct_literals(|parser| parser.block_statement(lbrace.span))?;
        self.consume_statement_end()?;

        Ok(FuncStmt {
            name: Ident {
                name: name.lexeme,
                span: name.span,
            },
            type_params,
            params,
            returns,
            body,
            span,
        })
    }

    /// Optional `-> Type` or `-> (T1, T2, ...)` clause.
    fn return_clause(&mut self) -> ParseResult<Vec<TypeExpr>> {
        if self.matches(&[TokenKind::Arrow])?.is_none() {
            return Ok(vec![]);
        }

        if self.matches(&[TokenKind::LParen])?.is_some() {
            let mut returns = vec![];
            loop {
                returns.push(self.type_expr()?);
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
            }
            self.consume(TokenKind::RParen, "expected ')' after return types")?;
            return Ok(returns);
        }

        Ok(vec![self.type_expr()?])
    }

    /// `struct Name[T, ...] { fields and methods }`.
    fn struct_declaration(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;
        let name = self.consume(TokenKind::Identifier, "expected struct name after 'struct'")?;

        let mut type_params = vec![];
        if self.check(TokenKind::LBracket)? {
            self.advance()?;
            loop {
                let param =
                    self.consume(TokenKind::Identifier, "expected type parameter name")?;
                type_params.push(Ident {
                    name: param.lexeme,
                    span: param.span,
                });
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
            }
            self.consume(TokenKind::RBracket, "expected ']' after type parameters")?;
        }

        self.consume(TokenKind::LBrace, "expected '{' after struct name")?;

        let mut fields = vec![];
        let mut methods = vec![];
        loop {
            self.skip_newlines()?;
            if self.check(TokenKind::RBrace)? {
                self.advance()?;
                break;
            }
            if self.check(TokenKind::Eof)? {
                return Err(ParseError::Incomplete("struct declaration".to_string()));
            }

            let token = self.peek()?;
            match token.kind {
                TokenKind::Func => {
                    self.advance()?;
                    methods.push(self.func_declaration(token.span)?);
                }
                TokenKind::Identifier => {
                    let field = self.advance()?;
                    self.consume(TokenKind::Colon, "expected ':' after field name")?;
                    let type_expr = self.type_expr()?;
                    self.consume_statement_end()?;
                    fields.push(FieldDecl {
                        name: Ident {
                            name: field.lexeme,
                            span: field.span,
                        },
                        type_expr,
                    });
                }
                _ => {
                    return Err(
                        self.unexpected(&token, "expected field or method in struct body")
                    );
                }
            }
        }
        self.consume_statement_end()?;

        Ok(Statement::Struct(StructStmt {
            name: Ident {
                name: name.lexeme,
                span: name.span,
            },
            type_params,
            fields,
            methods,
            span,
        }))
    }

    fn return_statement(&mut self) -> ParseResult<Statement> {
        let span = self.advance()?.span;

        let mut values = vec![];
        if !self.check(TokenKind::Newline)?
            && !self.check(TokenKind::RBrace)?
            && !self.check(TokenKind::Eof)?
        {
            loop {
                values.push(self.expression()?);
                if self.matches(&[TokenKind::Comma])?.is_none() {
                    break;
                }
                self.skip_newlines()?;
            }
        }
        self.consume_statement_end()?;

        Ok(Statement::Return(ReturnStmt { values, span }))
    }

    /// Parse the statements of a block; the `{` has already been
    /// consumed. EOF before the closing `}` makes the submission
    /// incomplete.
    pub(crate) fn block_statement(&mut self, span: Span) -> ParseResult<BlockStmt> {
        let mut statements = vec![];
        loop {
            self.skip_newlines()?;
            if self.check(TokenKind::RBrace)? {
                self.advance()?;
                return Ok(BlockStmt { statements, span });
            }
            if self.check(TokenKind::Eof)? {
                return Err(ParseError::Incomplete("block".to_string()));
            }
            statements.push(self.statement()?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;
    use crate::parser::ast::Expression;

    #[test]
    fn test_var_declaration() {
        let statements = parse("var x = 10").unwrap();
        let Statement::Var(var) = &statements[0] else {
            panic!("expected var statement");
        };
        assert_eq!(var.names.len(), 1);
        assert_eq!(var.names[0].name, "x");
        assert!(var.type_expr.is_none());
    }

    #[test]
    fn test_var_declaration_with_annotation() {
        let statements = parse("var x: int = 10").unwrap();
        let Statement::Var(var) = &statements[0] else {
            panic!("expected var statement");
        };
        assert_eq!(var.type_expr.as_ref().unwrap().name, "int");
    }

    #[test]
    fn test_multi_name_var_rejects_annotation() {
        let err = parse("var a, b: int = pair()").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_short_var_and_assignment_lookahead() {
        let statements = parse("x := 1\nx = 2\nx == 3").unwrap();
        assert!(matches!(statements[0], Statement::ShortVar(_)));
        assert!(matches!(statements[1], Statement::Assign(_)));
        assert!(matches!(statements[2], Statement::Expression(_)));
    }

    #[test]
    fn test_if_with_else() {
        let statements = parse("if x < 1 {\n print 1\n} else {\n print 2\n}").unwrap();
        let Statement::If(if_stmt) = &statements[0] else {
            panic!("expected if statement");
        };
        assert!(if_stmt.else_branch.is_some());
    }

    #[test]
    fn test_if_condition_is_not_a_struct_literal() {
        // `x` followed by `{` must open the block, not a struct literal
        let statements = parse("if x { print 1 }").unwrap();
        let Statement::If(if_stmt) = &statements[0] else {
            panic!("expected if statement");
        };
        assert!(matches!(if_stmt.condition, Expression::Variable(_)));
    }

    #[test]
    fn test_parenthesised_struct_literal_in_condition() {
        let statements = parse("if (p == Point{x: 1}) { print 1 }").unwrap();
        assert!(matches!(statements[0], Statement::If(_)));
    }

    #[test]
    fn test_for_with_all_clauses() {
        let statements = parse("for i := 0; i < 10; i = i + 1 {\n print i\n}").unwrap();
        let Statement::For(for_stmt) = &statements[0] else {
            panic!("expected for statement");
        };
        assert!(for_stmt.init.is_some());
        assert!(for_stmt.condition.is_some());
        assert!(for_stmt.update.is_some());
    }

    #[test]
    fn test_for_with_empty_clauses() {
        let statements = parse("for ;; { break }").unwrap();
        let Statement::For(for_stmt) = &statements[0] else {
            panic!("expected for statement");
        };
        assert!(for_stmt.init.is_none());
        assert!(for_stmt.condition.is_none());
        assert!(for_stmt.update.is_none());
    }

    #[test]
    fn test_func_declaration_single_return() {
        let statements = parse("func inc(x: int) -> int { return x + 1 }").unwrap();
        let Statement::Func(func) = &statements[0] else {
            panic!("expected func statement");
        };
        assert_eq!(func.name.name, "inc");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.returns.len(), 1);
    }

    #[test]
    fn test_func_declaration_multi_return() {
        let statements = parse("func pair() -> (int, int) { return 1, 2 }").unwrap();
        let Statement::Func(func) = &statements[0] else {
            panic!("expected func statement");
        };
        assert_eq!(func.returns.len(), 2);
        let Statement::Return(ret) = &func.body.statements[0] else {
            panic!("expected return statement");
        };
        assert_eq!(ret.values.len(), 2);
    }

    #[test]
    fn test_generic_func_declaration() {
        let statements = parse("func first[T](items: list) -> T { return items[0] }").unwrap();
        let Statement::Func(func) = &statements[0] else {
            panic!("expected func statement");
        };
        assert_eq!(func.type_params.len(), 1);
        assert_eq!(func.type_params[0].name, "T");
    }

    #[test]
    fn test_struct_declaration() {
        let source = "struct Point {\n x: int\n y: int\n}";
        let statements = parse(source).unwrap();
        let Statement::Struct(decl) = &statements[0] else {
            panic!("expected struct statement");
        };
        assert_eq!(decl.name.name, "Point");
        assert_eq!(decl.fields.len(), 2);
        assert!(decl.methods.is_empty());
    }

    #[test]
    fn test_struct_declaration_with_method_and_blank_lines() {
        let source = "struct Counter {\n\n n: int\n\n func bump(by: int) -> int {\n  return by\n }\n\n}";
        let statements = parse(source).unwrap();
        let Statement::Struct(decl) = &statements[0] else {
            panic!("expected struct statement");
        };
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.methods.len(), 1);
        assert_eq!(decl.methods[0].name.name, "bump");
    }

    #[test]
    fn test_generic_struct_declaration() {
        let statements = parse("struct Box[T] { v: T }").unwrap();
        let Statement::Struct(decl) = &statements[0] else {
            panic!("expected struct statement");
        };
        assert_eq!(decl.type_params.len(), 1);
        assert_eq!(decl.fields[0].type_expr.name, "T");
    }

    #[test]
    fn test_return_with_no_value() {
        let statements = parse("func f() { return }").unwrap();
        let Statement::Func(func) = &statements[0] else {
            panic!("expected func statement");
        };
        let Statement::Return(ret) = &func.body.statements[0] else {
            panic!("expected return statement");
        };
        assert!(ret.values.is_empty());
    }

    #[test]
    fn test_several_statements_on_one_line() {
        let statements = parse("c() c() c()").unwrap();
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn test_reserved_keyword_statement_errors() {
        assert!(parse("import foo").is_err());
    }
}
