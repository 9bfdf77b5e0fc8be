mod expression;
mod statement;
mod type_expr;

pub use self::expression::*;
pub use self::statement::*;
pub use self::type_expr::*;
