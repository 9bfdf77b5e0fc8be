//! Symbol tables: per-scope storage for the four symbol namespaces
//! (variables, functions, types, type parameters) with parent chaining,
//! plus the process-wide type registry and generic instantiation cache.

pub mod registry;

mod symbol;

pub use symbol::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::{error::Error, fmt::Display};

/// Shared handle to a scope's symbol table.
pub type ScopeRef = Rc<SymbolTable>;

/// Raised when a definition collides with an existing same-kind symbol
/// in the same scope. Shadowing in a child scope is fine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineError {
    pub kind: SymbolKind,
    pub name: String,
}

impl Display for DefineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' already defined in this scope",
            self.kind, self.name
        )
    }
}

impl Error for DefineError {}

/// One lexical scope: a map per namespace and a parent pointer. Lookup
/// walks the parent chain; definition only ever touches the local maps.
#[derive(Debug, Default)]
pub struct SymbolTable {
    vars: RefCell<HashMap<String, Rc<VarSymbol>>>,
    funcs: RefCell<HashMap<String, Rc<FuncSymbol>>>,
    types: RefCell<HashMap<String, Arc<TypeSymbol>>>,
    type_params: RefCell<HashMap<String, Rc<TypeParamSymbol>>>,
    parent: Option<ScopeRef>,
}

impl SymbolTable {
    pub fn new(parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(Self {
            parent,
            ..Self::default()
        })
    }

    pub fn parent(&self) -> Option<&ScopeRef> {
        self.parent.as_ref()
    }

    // definitions ---------------------------------------------------------

    pub fn define_var(&self, symbol: VarSymbol) -> Result<(), DefineError> {
        let mut vars = self.vars.borrow_mut();
        if vars.contains_key(&symbol.name) {
            return Err(DefineError {
                kind: SymbolKind::Var,
                name: symbol.name,
            });
        }
        vars.insert(symbol.name.clone(), Rc::new(symbol));
        Ok(())
    }

    pub fn define_func(&self, symbol: FuncSymbol) -> Result<(), DefineError> {
        let mut funcs = self.funcs.borrow_mut();
        if funcs.contains_key(&symbol.name) {
            return Err(DefineError {
                kind: SymbolKind::Func,
                name: symbol.name,
            });
        }
        funcs.insert(symbol.name.clone(), Rc::new(symbol));
        Ok(())
    }

    pub fn define_type(&self, symbol: Arc<TypeSymbol>) -> Result<(), DefineError> {
        let mut types = self.types.borrow_mut();
        if types.contains_key(&symbol.name) {
            return Err(DefineError {
                kind: SymbolKind::Type,
                name: symbol.name.clone(),
            });
        }
        types.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn define_type_param(&self, symbol: TypeParamSymbol) -> Result<(), DefineError> {
        let mut type_params = self.type_params.borrow_mut();
        if type_params.contains_key(&symbol.name) {
            return Err(DefineError {
                kind: SymbolKind::TypeParam,
                name: symbol.name,
            });
        }
        type_params.insert(symbol.name.clone(), Rc::new(symbol));
        Ok(())
    }

    // lookups -------------------------------------------------------------

    pub fn lookup_var(&self, name: &str) -> Option<Rc<VarSymbol>> {
        if let Some(found) = self.vars.borrow().get(name) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup_var(name))
    }

    pub fn lookup_func(&self, name: &str) -> Option<Rc<FuncSymbol>> {
        if let Some(found) = self.funcs.borrow().get(name) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup_func(name))
    }

    pub fn lookup_type(&self, name: &str) -> Option<Arc<TypeSymbol>> {
        if let Some(found) = self.types.borrow().get(name) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup_type(name))
    }

    pub fn lookup_type_param(&self, name: &str) -> Option<Rc<TypeParamSymbol>> {
        if let Some(found) = self.type_params.borrow().get(name) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|p| p.lookup_type_param(name))
    }

    // local checks --------------------------------------------------------

    pub fn has_local(&self, kind: SymbolKind, name: &str) -> bool {
        match kind {
            SymbolKind::Var => self.vars.borrow().contains_key(name),
            SymbolKind::Func => self.funcs.borrow().contains_key(name),
            SymbolKind::Type => self.types.borrow().contains_key(name),
            SymbolKind::TypeParam => self.type_params.borrow().contains_key(name),
        }
    }
}
