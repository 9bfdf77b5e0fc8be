use std::fmt::Display;

use crate::lexer::Span;

/// A syntactic type reference: a name plus optional type arguments,
/// e.g. `int`, `Box[string]` or `Pair[Box[int], float]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypeExpr {
    pub name: String,
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(name: impl ToString, span: Span) -> Self {
        Self {
            name: name.to_string(),
            args: vec![],
            span,
        }
    }
}

impl Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            let args = self
                .args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{args}]")?;
        }
        Ok(())
    }
}
