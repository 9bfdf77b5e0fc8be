//! Evaluation environments: a scope's symbol table bound to a value
//! frame, chained through parent pointers. Closures hold on to the
//! environment that was current at their defining site, so frames are
//! reference counted and mutated through interior mutability.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::symtable::{
    DefineError, FuncSymbol, ScopeRef, SymbolKind, SymbolTable, TypeParamSymbol, TypeSymbol,
    VarSymbol,
};
use crate::value::Value;

pub type EnvRef = Rc<Environment>;

#[derive(Debug)]
pub struct Environment {
    scope: ScopeRef,
    values: RefCell<HashMap<String, Value>>,
    parent: Option<EnvRef>,
}

impl Environment {
    /// A fresh root environment.
    pub fn new() -> EnvRef {
        Rc::new(Self {
            scope: SymbolTable::new(None),
            values: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// A child environment whose scope chains to the parent's scope.
    pub fn with_parent(parent: EnvRef) -> EnvRef {
        Rc::new(Self {
            scope: SymbolTable::new(Some(parent.scope.clone())),
            values: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    pub fn parent(&self) -> Option<&EnvRef> {
        self.parent.as_ref()
    }

    pub fn scope(&self) -> &ScopeRef {
        &self.scope
    }

    // symbol definitions (delegate to the scope's namespaces) -------------

    pub fn define_var(&self, symbol: VarSymbol) -> Result<(), DefineError> {
        self.scope.define_var(symbol)
    }

    pub fn define_func(&self, symbol: FuncSymbol) -> Result<(), DefineError> {
        self.scope.define_func(symbol)
    }

    pub fn define_type(&self, symbol: Arc<TypeSymbol>) -> Result<(), DefineError> {
        self.scope.define_type(symbol)
    }

    pub fn define_type_param(&self, symbol: TypeParamSymbol) -> Result<(), DefineError> {
        self.scope.define_type_param(symbol)
    }

    pub fn lookup_func(&self, name: &str) -> Option<Rc<FuncSymbol>> {
        self.scope.lookup_func(name)
    }

    pub fn lookup_type(&self, name: &str) -> Option<Arc<TypeSymbol>> {
        self.scope.lookup_type(name)
    }

    pub fn lookup_type_param(&self, name: &str) -> Option<Rc<TypeParamSymbol>> {
        self.scope.lookup_type_param(name)
    }

    // variable values -----------------------------------------------------

    /// Store a value for a variable already defined in *this* scope.
    pub fn bind(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    /// Update the variable in whichever enclosing scope defines it, so an
    /// inner scope can mutate outer variables it did not redeclare.
    /// Returns false when no scope in the chain defines the name.
    pub fn assign_var(&self, name: &str, value: Value) -> bool {
        if self.scope.has_local(SymbolKind::Var, name) {
            self.bind(name, value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign_var(name, value),
            None => false,
        }
    }

    /// Read a variable, walking parents. A variable that is defined but
    /// was never assigned reads as null.
    pub fn get_var(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.borrow().get(name) {
            return Some(value.clone());
        }
        if self.scope.has_local(SymbolKind::Var, name) {
            return Some(Value::Null);
        }
        self.parent.as_ref().and_then(|parent| parent.get_var(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(env: &EnvRef, name: &str, value: Value) {
        env.define_var(VarSymbol::new(name, true, None)).unwrap();
        env.bind(name, value);
    }

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        define(&env, "x", Value::Int(1));
        assert!(env.get_var("x").unwrap().equals(&Value::Int(1)));
    }

    #[test]
    fn test_get_walks_parents() {
        let parent = Environment::new();
        define(&parent, "x", Value::Int(1));
        let child = Environment::with_parent(parent);
        assert!(child.get_var("x").unwrap().equals(&Value::Int(1)));
    }

    #[test]
    fn test_undefined_variable() {
        let env = Environment::new();
        assert!(env.get_var("nope").is_none());
    }

    #[test]
    fn test_defined_but_unassigned_reads_null() {
        let env = Environment::new();
        env.define_var(VarSymbol::new("x", true, None)).unwrap();
        assert!(env.get_var("x").unwrap().equals(&Value::Null));
    }

    #[test]
    fn test_assign_mutates_defining_scope() {
        let parent = Environment::new();
        define(&parent, "x", Value::Int(1));

        let child = Environment::with_parent(parent.clone());
        assert!(child.assign_var("x", Value::Int(42)));

        assert!(parent.get_var("x").unwrap().equals(&Value::Int(42)));
        assert!(child.get_var("x").unwrap().equals(&Value::Int(42)));
    }

    #[test]
    fn test_assign_undefined_fails() {
        let env = Environment::new();
        assert!(!env.assign_var("nope", Value::Int(1)));
    }

    #[test]
    fn test_shadowing_does_not_touch_outer() {
        let parent = Environment::new();
        define(&parent, "x", Value::Int(1));

        let child = Environment::with_parent(parent.clone());
        define(&child, "x", Value::Int(2));
        assert!(child.assign_var("x", Value::Int(3)));

        assert!(parent.get_var("x").unwrap().equals(&Value::Int(1)));
        assert!(child.get_var("x").unwrap().equals(&Value::Int(3)));
    }

    #[test]
    fn test_sibling_environments_share_parent_frame() {
        let parent = Environment::new();
        define(&parent, "n", Value::Int(0));

        let a = Environment::with_parent(parent.clone());
        let b = Environment::with_parent(parent);
        assert!(a.assign_var("n", Value::Int(5)));
        assert!(b.get_var("n").unwrap().equals(&Value::Int(5)));
    }
}
