use crate::lexer::{Span, Token};

use super::{BlockStmt, Param, TypeExpr};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Expression {
    Literal(LiteralExpr),
    Variable(VariableExpr),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Call(Box<CallExpr>),
    Index(Box<IndexExpr>),
    Get(Box<GetExpr>),
    List(ListExpr),
    Dict(DictExpr),
    StructLiteral(StructLiteralExpr),
    Func(FuncExpr),
}

impl Expression {
    pub fn position(&self) -> Span {
        match self {
            Expression::Literal(e) => e.value.span,
            Expression::Variable(e) => e.span,
            Expression::Unary(e) => e.operator.span,
            Expression::Binary(e) => e.operator.span,
            Expression::Call(e) => e.span,
            Expression::Index(e) => e.span,
            Expression::Get(e) => e.span,
            Expression::List(e) => e.span,
            Expression::Dict(e) => e.span,
            Expression::StructLiteral(e) => e.span,
            Expression::Func(e) => e.span,
        }
    }
}

/// A literal token carried verbatim: number, string, boolean or `nil`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LiteralExpr {
    pub value: Token,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VariableExpr {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnaryExpr {
    pub operator: Token,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BinaryExpr {
    pub left: Expression,
    pub operator: Token,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CallExpr {
    pub callee: Expression,
    pub type_args: Vec<TypeExpr>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexExpr {
    pub collection: Expression,
    pub index: Expression,
    pub span: Span,
}

/// Member access: `object.name`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GetExpr {
    pub object: Expression,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ListExpr {
    pub elements: Vec<Expression>,
    pub span: Span,
}

/// Dict literal; keys are arbitrary expressions, not just strings.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DictExpr {
    pub pairs: Vec<(Expression, Expression)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructLiteralExpr {
    pub type_expr: TypeExpr,
    pub fields: Vec<(String, Expression)>,
    pub span: Span,
}

/// Anonymous function expression.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FuncExpr {
    pub params: Vec<Param>,
    pub body: BlockStmt,
    pub span: Span,
}
