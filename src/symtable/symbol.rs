use std::fmt::Display;
use std::sync::Arc;

use indexmap::IndexMap;

/// The four disjoint namespaces a scope keeps symbols in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Var,
    Func,
    Type,
    TypeParam,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SymbolKind::Var => "variable",
            SymbolKind::Func => "function",
            SymbolKind::Type => "type",
            SymbolKind::TypeParam => "type parameter",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct VarSymbol {
    pub name: String,
    pub mutable: bool,
    /// Resolved type, when an annotation was given or could be derived.
    pub ty: Option<Arc<TypeSymbol>>,
}

impl VarSymbol {
    pub fn new(name: impl ToString, mutable: bool, ty: Option<Arc<TypeSymbol>>) -> Self {
        Self {
            name: name.to_string(),
            mutable,
            ty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamSymbol {
    pub name: String,
    pub ty: Arc<TypeSymbol>,
}

#[derive(Debug, Clone)]
pub struct FuncSymbol {
    pub name: String,
    pub params: Vec<ParamSymbol>,
    pub returns: Vec<Arc<TypeSymbol>>,
    pub type_params: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Builtin,
    Struct,
    Tuple,
    /// Placeholder for an unsubstituted type parameter inside a generic
    /// type's field definitions.
    Param,
}

/// A resolved type. Deliberately plain data (no captured environments,
/// no interior mutability) so instances can live in the process-wide
/// registry and instantiation caches. Generic instantiations are
/// memoized; two instantiations with the same canonical name are the
/// same `Arc` (compare with [`Arc::ptr_eq`]).
#[derive(Debug)]
pub struct TypeSymbol {
    pub name: String,
    pub kind: TypeKind,
    /// Field name → field type, in declaration order.
    pub fields: IndexMap<String, Arc<TypeSymbol>>,
    pub type_params: Vec<String>,
    pub is_generic: bool,
    /// For an instantiated generic: the concrete arguments used.
    pub type_args: Vec<Arc<TypeSymbol>>,
    /// For an instantiated generic: the generic type it came from.
    pub origin: Option<Arc<TypeSymbol>>,
}

impl TypeSymbol {
    pub fn builtin(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Builtin,
            fields: IndexMap::new(),
            type_params: vec![],
            is_generic: false,
            type_args: vec![],
            origin: None,
        }
    }

    pub fn param(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Param,
            fields: IndexMap::new(),
            type_params: vec![],
            is_generic: false,
            type_args: vec![],
            origin: None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Arc<TypeSymbol>> {
        self.fields.get(name)
    }

    /// The name methods are registered under: the generic origin for
    /// instantiated types, the type's own name otherwise.
    pub fn method_key(&self) -> &str {
        match &self.origin {
            Some(origin) => &origin.name,
            None => &self.name,
        }
    }
}

impl Display for TypeSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct TypeParamSymbol {
    pub name: String,
}
