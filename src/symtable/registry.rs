//! Process-wide type state: the built-in type registry and the memoized
//! generic/tuple instantiation caches.
//!
//! Everything here is plain `Arc<TypeSymbol>` data behind a mutex, so
//! several independent interpreter instances in one process share the
//! caches safely. The observable contract is identity: equal canonical
//! instantiation names resolve to the same symbol object.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

use super::{TypeKind, TypeSymbol};

/// Names of the built-in primitive type symbols registered at startup.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "int", "float", "string", "bool", "null", "tuple", "list", "dict", "struct", "func",
];

static BUILTINS: Lazy<HashMap<&'static str, Arc<TypeSymbol>>> = Lazy::new(|| {
    BUILTIN_TYPE_NAMES
        .iter()
        .map(|name| (*name, Arc::new(TypeSymbol::builtin(name))))
        .collect()
});

static GENERIC_CACHE: Lazy<Mutex<HashMap<String, Arc<TypeSymbol>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

static TUPLE_CACHE: Lazy<Mutex<HashMap<String, Arc<TypeSymbol>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Look up a built-in type symbol by name.
pub fn builtin(name: &str) -> Option<Arc<TypeSymbol>> {
    BUILTINS.get(name).cloned()
}

/// All built-in type symbols, for seeding a fresh global scope.
pub fn builtins() -> Vec<Arc<TypeSymbol>> {
    BUILTIN_TYPE_NAMES
        .iter()
        .filter_map(|name| builtin(name))
        .collect()
}

/// Canonical name of an instantiation: `Base[Arg1,Arg2,...]`. Arguments
/// use their own canonical names, so nested instantiations compose.
pub fn instantiation_name(base: &str, args: &[Arc<TypeSymbol>]) -> String {
    let args = args
        .iter()
        .map(|arg| arg.name.clone())
        .collect::<Vec<_>>()
        .join(",");
    format!("{base}[{args}]")
}

/// Canonical name of a tuple type: `(T1,T2,...)`.
pub fn tuple_name(elements: &[Arc<TypeSymbol>]) -> String {
    let elements = elements
        .iter()
        .map(|ty| ty.name.clone())
        .collect::<Vec<_>>()
        .join(",");
    format!("({elements})")
}

/// Instantiate a generic type with concrete arguments, memoized by
/// canonical name. Non-generic origins and arity mismatches fall back to
/// the origin itself; arity is validated by the caller, which can report
/// a positioned error.
pub fn instantiate_generic(origin: &Arc<TypeSymbol>, args: &[Arc<TypeSymbol>]) -> Arc<TypeSymbol> {
    if !origin.is_generic || origin.type_params.len() != args.len() {
        return origin.clone();
    }

    let key = instantiation_name(&origin.name, args);
    if let Some(cached) = GENERIC_CACHE.lock().unwrap().get(&key) {
        return cached.clone();
    }

    let param_map: HashMap<&str, Arc<TypeSymbol>> = origin
        .type_params
        .iter()
        .map(String::as_str)
        .zip(args.iter().cloned())
        .collect();

    let fields = origin
        .fields
        .iter()
        .map(|(name, ty)| (name.clone(), substitute(ty, &param_map)))
        .collect();

    let instantiated = Arc::new(TypeSymbol {
        name: key.clone(),
        kind: origin.kind,
        fields,
        type_params: vec![],
        is_generic: false,
        type_args: args.to_vec(),
        origin: Some(origin.clone()),
    });

    // a racing instantiation of the same key must win to keep identity
    GENERIC_CACHE
        .lock()
        .unwrap()
        .entry(key)
        .or_insert(instantiated)
        .clone()
}

/// Replace type parameters by their concrete arguments, recursing into
/// nested instantiations via the origin back-pointer.
fn substitute(ty: &Arc<TypeSymbol>, param_map: &HashMap<&str, Arc<TypeSymbol>>) -> Arc<TypeSymbol> {
    if let Some(concrete) = param_map.get(ty.name.as_str()) {
        return concrete.clone();
    }

    if let Some(origin) = &ty.origin {
        if !ty.type_args.is_empty() {
            let args = ty
                .type_args
                .iter()
                .map(|arg| substitute(arg, param_map))
                .collect::<Vec<_>>();
            return instantiate_generic(origin, &args);
        }
    }

    ty.clone()
}

/// The memoized anonymous tuple type for the given element types.
pub fn tuple_type(elements: &[Arc<TypeSymbol>]) -> Arc<TypeSymbol> {
    let key = tuple_name(elements);
    if let Some(cached) = TUPLE_CACHE.lock().unwrap().get(&key) {
        return cached.clone();
    }

    let ty = Arc::new(TypeSymbol {
        name: key.clone(),
        kind: TypeKind::Tuple,
        fields: indexmap::IndexMap::new(),
        type_params: vec![],
        is_generic: false,
        type_args: elements.to_vec(),
        origin: None,
    });

    TUPLE_CACHE.lock().unwrap().entry(key).or_insert(ty).clone()
}
