use crate::lexer::Span;

use super::{Expression, TypeExpr};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Statement {
    Var(VarStmt),
    ShortVar(ShortVarStmt),
    Assign(AssignStmt),
    Print(PrintStmt),
    Expression(ExprStmt),
    If(Box<IfStmt>),
    While(Box<WhileStmt>),
    For(Box<ForStmt>),
    Func(FuncStmt),
    Struct(StructStmt),
    Return(ReturnStmt),
    Break(BreakStmt),
    Continue(ContinueStmt),
    Block(BlockStmt),
}

impl Statement {
    pub fn position(&self) -> Span {
        match self {
            Statement::Var(s) => s.span,
            Statement::ShortVar(s) => s.name.span,
            Statement::Assign(s) => s.name.span,
            Statement::Print(s) => s.span,
            Statement::Expression(s) => s.expr.position(),
            Statement::If(s) => s.span,
            Statement::While(s) => s.span,
            Statement::For(s) => s.span,
            Statement::Func(s) => s.span,
            Statement::Struct(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Block(s) => s.span,
        }
    }
}

/// A plain named occurrence in a declaration position.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A typed function parameter: `name: Type`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Param {
    pub name: Ident,
    pub type_expr: TypeExpr,
}

/// `var a = expr`, `var a: Type = expr` or `var a, b = expr` (unpacking).
/// The type annotation is only permitted with a single name.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VarStmt {
    pub names: Vec<Ident>,
    pub type_expr: Option<TypeExpr>,
    pub init: Expression,
    pub span: Span,
}

/// `name := expr`
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShortVarStmt {
    pub name: Ident,
    pub init: Expression,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AssignStmt {
    pub name: Ident,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PrintStmt {
    pub expr: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExprStmt {
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IfStmt {
    pub condition: Expression,
    pub then_branch: BlockStmt,
    pub else_branch: Option<BlockStmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WhileStmt {
    pub condition: Expression,
    pub body: BlockStmt,
    pub span: Span,
}

/// C-style `for init; cond; update { ... }`; every clause may be empty.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForStmt {
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expression>,
    pub update: Option<Box<Statement>>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FuncStmt {
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub params: Vec<Param>,
    pub returns: Vec<TypeExpr>,
    pub body: BlockStmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldDecl {
    pub name: Ident,
    pub type_expr: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructStmt {
    pub name: Ident,
    pub type_params: Vec<Ident>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FuncStmt>,
    pub span: Span,
}

/// `return` with zero, one or many values.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReturnStmt {
    pub values: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BreakStmt {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContinueStmt {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockStmt {
    pub statements: Vec<Statement>,
    pub span: Span,
}
