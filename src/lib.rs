//! Rill: an interpreter for a small statically-shaped imperative
//! language with first-class functions, struct types with methods,
//! parametric generics, tuples, lists and dictionaries.
//!
//! The pipeline is leaf-first: [`lexer`] turns source text into tokens
//! on demand, [`parser`] builds the AST (reporting *incomplete input*
//! distinctly from syntax errors so a REPL can keep reading),
//! [`symtable`] provides four-namespace lexical scopes and the memoized
//! generic-type registry, and [`interpreter`] walks the tree against an
//! [`environment`] chain, threading control flow as data.

pub mod environment;
pub mod formatter;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod symtable;
pub mod value;
