use std::fmt::Write;

use crate::lexer::{Literal, TokenKind};
use crate::parser::ast::{
    BinaryExpr, CallExpr, DictExpr, Expression, FuncExpr, GetExpr, IndexExpr, ListExpr,
    LiteralExpr, StructLiteralExpr, TypeExpr, UnaryExpr, VariableExpr,
};

use super::{Format, FormatterContext};

impl Format for Expression {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        match self {
            Expression::Literal(literal) => literal.format(ctx),
            Expression::Variable(variable) => variable.format(ctx),
            Expression::Unary(unary) => unary.format(ctx),
            Expression::Binary(binary) => binary.format(ctx),
            Expression::Call(call) => call.format(ctx),
            Expression::Index(index) => index.format(ctx),
            Expression::Get(get) => get.format(ctx),
            Expression::List(list) => list.format(ctx),
            Expression::Dict(dict) => dict.format(ctx),
            Expression::StructLiteral(literal) => literal.format(ctx),
            Expression::Func(func) => func.format(ctx),
        }
    }
}

impl Format for LiteralExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        match (&self.value.kind, &self.value.literal) {
            (TokenKind::Str, Some(Literal::Str(value))) => {
                write!(ctx.output, "\"{}\"", escape_string(value))
            }
            (_, Some(Literal::Int(value))) => write!(ctx.output, "{value}"),
            (_, Some(Literal::Float(value))) => {
                // keep a trailing digit so the token stays a float
                if value.fract() == 0.0 {
                    write!(ctx.output, "{value:.1}")
                } else {
                    write!(ctx.output, "{value}")
                }
            }
            _ => ctx.write(self.value.kind.as_str()),
        }
    }
}

impl Format for VariableExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write(&self.name)
    }
}

impl Format for UnaryExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write(self.operator.kind.as_str())?;
        format_operand(&self.right, ctx)
    }
}

impl Format for BinaryExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        format_operand(&self.left, ctx)?;
        write!(ctx.output, " {} ", self.operator.kind)?;
        format_operand(&self.right, ctx)
    }
}

/// Operands of unary/binary operators are parenthesised when they are
/// compound themselves, so the printed precedence is exactly the parsed
/// one.
fn format_operand(expr: &Expression, ctx: &mut FormatterContext) -> std::fmt::Result {
    match expr {
        Expression::Binary(_) | Expression::Unary(_) => {
            ctx.write("(")?;
            expr.format(ctx)?;
            ctx.write(")")
        }
        _ => expr.format(ctx),
    }
}

impl Format for CallExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        // a call on an indexing result needs parentheses, otherwise the
        // brackets would re-parse as type arguments
        match &self.callee {
            Expression::Index(_) if self.type_args.is_empty() => {
                ctx.write("(")?;
                self.callee.format(ctx)?;
                ctx.write(")")?;
            }
            callee => format_operand(callee, ctx)?,
        }
        if !self.type_args.is_empty() {
            ctx.write("[")?;
            ctx.write_separated(&self.type_args, ", ", |ctx, arg| arg.format(ctx))?;
            ctx.write("]")?;
        }
        ctx.write("(")?;
        ctx.write_separated(&self.arguments, ", ", |ctx, argument| argument.format(ctx))?;
        ctx.write(")")
    }
}

impl Format for IndexExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        format_operand(&self.collection, ctx)?;
        ctx.write("[")?;
        self.index.format(ctx)?;
        ctx.write("]")
    }
}

impl Format for GetExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        format_operand(&self.object, ctx)?;
        ctx.write(".")?;
        ctx.write(&self.name)
    }
}

impl Format for ListExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("[")?;
        ctx.write_separated(&self.elements, ", ", |ctx, element| element.format(ctx))?;
        ctx.write("]")
    }
}

impl Format for DictExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("{")?;
        ctx.write_separated(&self.pairs, ", ", |ctx, (key, value)| {
            key.format(ctx)?;
            ctx.write(": ")?;
            value.format(ctx)
        })?;
        ctx.write("}")
    }
}

impl Format for StructLiteralExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        self.type_expr.format(ctx)?;
        ctx.write("{")?;
        ctx.write_separated(&self.fields, ", ", |ctx, (name, value)| {
            ctx.write(name)?;
            ctx.write(": ")?;
            value.format(ctx)
        })?;
        ctx.write("}")
    }
}

impl Format for FuncExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("func (")?;
        ctx.write_separated(&self.params, ", ", |ctx, param| {
            ctx.write(&param.name.name)?;
            ctx.write(": ")?;
            param.type_expr.format(ctx)
        })?;
        ctx.write(") ")?;
        self.body.format(ctx)
    }
}

impl Format for TypeExpr {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write(&self.name)?;
        if !self.args.is_empty() {
            ctx.write("[")?;
            ctx.write_separated(&self.args, ", ", |ctx, arg| arg.format(ctx))?;
            ctx.write("]")?;
        }
        Ok(())
    }
}

/// Does this expression contain a struct literal in a position where a
/// loop or `if` header would misread its brace? Mirrors where the parser
/// keeps struct literals disabled: operator chains, member access,
/// call/index heads. Bracketed sub-positions re-enable them.
pub(super) fn needs_header_parens(expr: &Expression) -> bool {
    match expr {
        Expression::StructLiteral(_) => true,
        Expression::Binary(binary) => {
            needs_header_parens(&binary.left) || needs_header_parens(&binary.right)
        }
        Expression::Unary(unary) => needs_header_parens(&unary.right),
        Expression::Get(get) => needs_header_parens(&get.object),
        Expression::Call(call) => needs_header_parens(&call.callee),
        Expression::Index(index) => needs_header_parens(&index.collection),
        _ => false,
    }
}

fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}
