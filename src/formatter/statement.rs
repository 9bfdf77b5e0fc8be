use crate::parser::ast::{
    AssignStmt, BlockStmt, Expression, FuncStmt, IfStmt, PrintStmt, ReturnStmt, ShortVarStmt,
    Statement, StructStmt, VarStmt,
};

use super::expression::needs_header_parens;
use super::{Format, FormatterContext};

impl Format for Statement {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        match self {
            Statement::Var(stmt) => stmt.format(ctx),
            Statement::ShortVar(stmt) => stmt.format(ctx),
            Statement::Assign(stmt) => stmt.format(ctx),
            Statement::Print(stmt) => stmt.format(ctx),
            Statement::Expression(stmt) => stmt.expr.format(ctx),
            Statement::If(stmt) => stmt.format(ctx),
            Statement::While(stmt) => {
                ctx.write("while ")?;
                format_header_expression(&stmt.condition, ctx)?;
                ctx.write(" ")?;
                stmt.body.format(ctx)
            }
            Statement::For(stmt) => {
                ctx.write("for ")?;
                if let Some(init) = &stmt.init {
                    init.format(ctx)?;
                }
                ctx.write("; ")?;
                if let Some(condition) = &stmt.condition {
                    format_header_expression(condition, ctx)?;
                }
                ctx.write("; ")?;
                if let Some(update) = &stmt.update {
                    update.format(ctx)?;
                }
                ctx.write(" ")?;
                stmt.body.format(ctx)
            }
            Statement::Func(stmt) => stmt.format(ctx),
            Statement::Struct(stmt) => stmt.format(ctx),
            Statement::Return(stmt) => stmt.format(ctx),
            Statement::Break(_) => ctx.write("break"),
            Statement::Continue(_) => ctx.write("continue"),
            Statement::Block(block) => block.format(ctx),
        }
    }
}

/// `if`/`while`/`for` headers parse with struct literals disabled, so a
/// header expression containing one is wrapped in parentheses.
fn format_header_expression(expr: &Expression, ctx: &mut FormatterContext) -> std::fmt::Result {
    if needs_header_parens(expr) {
        ctx.write("(")?;
        expr.format(ctx)?;
        ctx.write(")")
    } else {
        expr.format(ctx)
    }
}

impl Format for VarStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("var ")?;
        ctx.write_separated(&self.names, ", ", |ctx, name| ctx.write(&name.name))?;
        if let Some(type_expr) = &self.type_expr {
            ctx.write(": ")?;
            type_expr.format(ctx)?;
        }
        ctx.write(" = ")?;
        self.init.format(ctx)
    }
}

impl Format for ShortVarStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write(&self.name.name)?;
        ctx.write(" := ")?;
        self.init.format(ctx)
    }
}

impl Format for AssignStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write(&self.name.name)?;
        ctx.write(" = ")?;
        self.value.format(ctx)
    }
}

impl Format for PrintStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("print ")?;
        self.expr.format(ctx)
    }
}

impl Format for IfStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("if ")?;
        format_header_expression(&self.condition, ctx)?;
        ctx.write(" ")?;
        self.then_branch.format(ctx)?;
        if let Some(else_branch) = &self.else_branch {
            ctx.write(" else ")?;
            else_branch.format(ctx)?;
        }
        Ok(())
    }
}

impl Format for FuncStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("func ")?;
        ctx.write(&self.name.name)?;
        if !self.type_params.is_empty() {
            ctx.write("[")?;
            ctx.write_separated(&self.type_params, ", ", |ctx, param| ctx.write(&param.name))?;
            ctx.write("]")?;
        }
        ctx.write("(")?;
        ctx.write_separated(&self.params, ", ", |ctx, param| {
            ctx.write(&param.name.name)?;
            ctx.write(": ")?;
            param.type_expr.format(ctx)
        })?;
        ctx.write(")")?;
        match self.returns.as_slice() {
            [] => {}
            [single] => {
                ctx.write(" -> ")?;
                single.format(ctx)?;
            }
            many => {
                ctx.write(" -> (")?;
                ctx.write_separated(many, ", ", |ctx, ret| ret.format(ctx))?;
                ctx.write(")")?;
            }
        }
        ctx.write(" ")?;
        self.body.format(ctx)
    }
}

impl Format for StructStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("struct ")?;
        ctx.write(&self.name.name)?;
        if !self.type_params.is_empty() {
            ctx.write("[")?;
            ctx.write_separated(&self.type_params, ", ", |ctx, param| ctx.write(&param.name))?;
            ctx.write("]")?;
        }
        ctx.write(" {")?;
        ctx.newline()?;
        ctx.push_indent();
        for field in &self.fields {
            ctx.indent()?;
            ctx.write(&field.name.name)?;
            ctx.write(": ")?;
            field.type_expr.format(ctx)?;
            ctx.newline()?;
        }
        for method in &self.methods {
            ctx.indent()?;
            method.format(ctx)?;
            ctx.newline()?;
        }
        ctx.pop_indent();
        ctx.indent()?;
        ctx.write("}")
    }
}

impl Format for ReturnStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("return")?;
        if !self.values.is_empty() {
            ctx.write(" ")?;
            ctx.write_separated(&self.values, ", ", |ctx, value| value.format(ctx))?;
        }
        Ok(())
    }
}

impl Format for BlockStmt {
    fn format(&self, ctx: &mut FormatterContext) -> std::fmt::Result {
        ctx.write("{")?;
        ctx.newline()?;
        ctx.push_indent();
        for statement in &self.statements {
            ctx.indent()?;
            statement.format(ctx)?;
            ctx.newline()?;
        }
        ctx.pop_indent();
        ctx.indent()?;
        ctx.write("}")
    }
}
