//! The tree-walking evaluator. Owns the active environment and an
//! environment stack; every statement executor returns a control-flow
//! packet ([`Exec`]) or a [`RuntimeError`], never unwinds.

mod control_flow;
mod error;
mod expression;
mod function;

pub use control_flow::Exec;
pub use error::RuntimeError;
pub use function::{Function, NativeFn, NativeFunction, UserFunction};

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::environment::{EnvRef, Environment};
use crate::lexer::Span;
use crate::parser::ast::{
    BlockStmt, ForStmt, FuncStmt, Ident, Param, Statement, StructStmt, TypeExpr, VarStmt,
};
use crate::symtable::{
    registry, FuncSymbol, ParamSymbol, TypeKind, TypeParamSymbol, TypeSymbol, VarSymbol,
};
use crate::value::{TupleValue, Value};

pub type ExecResult = Result<Exec, RuntimeError>;

pub struct Interpreter {
    env: EnvRef,
    env_stack: Vec<EnvRef>,
    globals: EnvRef,
    /// Method tables, keyed by the defining type's name. Instantiations
    /// of a generic type share the origin's table.
    methods: HashMap<String, IndexMap<String, Rc<Function>>>,
    /// When set, non-null results of expression statements are printed
    /// (REPL echoing).
    echo: bool,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }

    /// An interpreter writing `print` output to the given sink.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        for builtin in registry::builtins() {
            // the global scope is empty, the builtin names are distinct
            let _ = globals.define_type(builtin);
        }

        Self {
            env: globals.clone(),
            env_stack: vec![],
            globals,
            methods: HashMap::new(),
            echo: false,
            output,
        }
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    pub fn env(&self) -> &EnvRef {
        &self.env
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    // environment stack ---------------------------------------------------

    pub fn push_env(&mut self, env: EnvRef) {
        self.env_stack.push(std::mem::replace(&mut self.env, env));
    }

    pub fn pop_env(&mut self) {
        if let Some(previous) = self.env_stack.pop() {
            self.env = previous;
        }
    }

    fn push_child_env(&mut self) {
        self.push_env(Environment::with_parent(self.env.clone()));
    }

    // entry points --------------------------------------------------------

    /// Execute a top-level statement. Loose control-flow packets are
    /// errors at this level: `break`/`continue` belong in loops and
    /// `return` in a function body.
    pub fn execute(&mut self, statement: &Statement) -> Result<Value, RuntimeError> {
        let span = statement.position();
        match self.execute_statement(statement)? {
            Exec::Normal(value) => Ok(value),
            Exec::Return(_) => Err(RuntimeError::ReturnOutsideFunction { span }),
            Exec::Break => Err(RuntimeError::BreakOutsideLoop { span }),
            Exec::Continue => Err(RuntimeError::ContinueOutsideLoop { span }),
        }
    }

    /// Execute a whole program, stopping at the first runtime error.
    pub fn run(&mut self, statements: &[Statement]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    // statement execution -------------------------------------------------

    pub(crate) fn execute_statement(&mut self, statement: &Statement) -> ExecResult {
        match statement {
            Statement::Var(stmt) => self.execute_var(stmt),
            Statement::ShortVar(stmt) => {
                let value = self.eval(&stmt.init)?;
                self.define_variable(&stmt.name, None, value)?;
                Ok(Exec::Normal(Value::Null))
            }
            Statement::Assign(stmt) => {
                let value = self.eval(&stmt.value)?;
                if !self.env.assign_var(&stmt.name.name, value) {
                    return Err(RuntimeError::UndefinedVariable {
                        name: stmt.name.name.clone(),
                        span: stmt.name.span,
                    });
                }
                Ok(Exec::Normal(Value::Null))
            }
            Statement::Print(stmt) => {
                let value = self.eval(&stmt.expr)?;
                self.write_line(&value)?;
                Ok(Exec::Normal(Value::Null))
            }
            Statement::Expression(stmt) => {
                let value = self.eval(&stmt.expr)?;
                if self.echo && !matches!(value, Value::Null) {
                    self.write_line(&value)?;
                }
                Ok(Exec::Normal(value))
            }
            Statement::If(stmt) => {
                let condition = self.eval(&stmt.condition)?;
                let Some(condition) = condition.is_truthy_bool() else {
                    return Err(RuntimeError::type_error(
                        format!(
                            "if condition must be a boolean, got '{}'",
                            condition.type_name()
                        ),
                        stmt.condition.position(),
                    ));
                };
                if condition {
                    self.execute_block(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.execute_block(else_branch)
                } else {
                    Ok(Exec::Normal(Value::Null))
                }
            }
            Statement::While(stmt) => loop {
                let condition = self.eval(&stmt.condition)?;
                let Some(condition) = condition.is_truthy_bool() else {
                    return Err(RuntimeError::type_error(
                        format!(
                            "while condition must be a boolean, got '{}'",
                            condition.type_name()
                        ),
                        stmt.condition.position(),
                    ));
                };
                if !condition {
                    return Ok(Exec::Normal(Value::Null));
                }
                match self.execute_block(&stmt.body)? {
                    Exec::Break => return Ok(Exec::Normal(Value::Null)),
                    Exec::Normal(_) | Exec::Continue => {}
                    packet @ Exec::Return(_) => return Ok(packet),
                }
            },
            Statement::For(stmt) => {
                // the whole loop, clauses included, runs in one pushed
                // environment
                self.push_child_env();
                let result = self.execute_for(stmt);
                self.pop_env();
                result
            }
            Statement::Func(stmt) => self.execute_func_decl(stmt),
            Statement::Struct(stmt) => self.execute_struct_decl(stmt),
            Statement::Return(stmt) => {
                let value = match stmt.values.len() {
                    0 => Value::Null,
                    1 => self.eval(&stmt.values[0])?,
                    _ => {
                        let elements = stmt
                            .values
                            .iter()
                            .map(|value| self.eval(value))
                            .collect::<Result<Vec<_>, _>>()?;
                        let types = elements
                            .iter()
                            .map(Value::type_symbol)
                            .collect::<Vec<_>>();
                        Value::Tuple(Rc::new(TupleValue {
                            ty: registry::tuple_type(&types),
                            elements,
                        }))
                    }
                };
                Ok(Exec::Return(value))
            }
            Statement::Break(_) => Ok(Exec::Break),
            Statement::Continue(_) => Ok(Exec::Continue),
            Statement::Block(block) => self.execute_block(block),
        }
    }

    /// Run statements in the current environment; the first non-normal
    /// packet (or error) aborts the sequence.
    pub(crate) fn execute_statements(&mut self, statements: &[Statement]) -> ExecResult {
        for statement in statements {
            let packet = self.execute_statement(statement)?;
            if !packet.is_normal() {
                return Ok(packet);
            }
        }
        Ok(Exec::Normal(Value::Null))
    }

    /// Run a block in a fresh child environment, popped on every exit.
    pub(crate) fn execute_block(&mut self, block: &BlockStmt) -> ExecResult {
        self.push_child_env();
        let result = self.execute_statements(&block.statements);
        self.pop_env();
        result
    }

    fn execute_var(&mut self, stmt: &VarStmt) -> ExecResult {
        let init = self.eval(&stmt.init)?;
        let annotated = match &stmt.type_expr {
            Some(type_expr) => Some(self.resolve_type_expr(type_expr)?),
            None => None,
        };

        if let [name] = stmt.names.as_slice() {
            self.define_variable(name, annotated, init)?;
            return Ok(Exec::Normal(Value::Null));
        }

        // multi-name declarations unpack a tuple of matching arity
        let Value::Tuple(tuple) = init else {
            return Err(RuntimeError::UnpackMismatch {
                expected: stmt.names.len(),
                found: 1,
                span: stmt.span,
            });
        };
        if tuple.elements.len() != stmt.names.len() {
            return Err(RuntimeError::UnpackMismatch {
                expected: stmt.names.len(),
                found: tuple.elements.len(),
                span: stmt.span,
            });
        }
        for (name, value) in stmt.names.iter().zip(tuple.elements.iter()) {
            self.define_variable(name, None, value.clone())?;
        }
        Ok(Exec::Normal(Value::Null))
    }

    fn define_variable(
        &mut self,
        name: &Ident,
        ty: Option<Arc<TypeSymbol>>,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.env
            .define_var(VarSymbol::new(&name.name, true, ty))
            .map_err(|err| RuntimeError::duplicate(err, name.span))?;
        self.env.bind(&name.name, value);
        Ok(())
    }

    fn execute_for(&mut self, stmt: &ForStmt) -> ExecResult {
        if let Some(init) = &stmt.init {
            self.execute_statement(init)?;
        }
        loop {
            if let Some(condition) = &stmt.condition {
                let value = self.eval(condition)?;
                let Some(keep_going) = value.is_truthy_bool() else {
                    return Err(RuntimeError::type_error(
                        format!(
                            "for condition must be a boolean, got '{}'",
                            value.type_name()
                        ),
                        condition.position(),
                    ));
                };
                if !keep_going {
                    return Ok(Exec::Normal(Value::Null));
                }
            }
            match self.execute_block(&stmt.body)? {
                Exec::Break => return Ok(Exec::Normal(Value::Null)),
                Exec::Normal(_) | Exec::Continue => {}
                packet @ Exec::Return(_) => return Ok(packet),
            }
            if let Some(update) = &stmt.update {
                self.execute_statement(update)?;
            }
        }
    }

    // declarations --------------------------------------------------------

    fn execute_func_decl(&mut self, decl: &FuncStmt) -> ExecResult {
        debug!("declaring function '{}'", decl.name.name);
        let (function, symbol) = self.build_function(
            Some(decl.name.name.clone()),
            &decl.type_params,
            &decl.params,
            &decl.returns,
            &decl.body,
            decl.span,
        )?;

        self.env
            .define_func(symbol)
            .map_err(|err| RuntimeError::duplicate(err, decl.name.span))?;

        // functions double as values so they work in expression position
        self.env
            .define_var(VarSymbol::new(
                &decl.name.name,
                false,
                registry::builtin("func"),
            ))
            .map_err(|err| RuntimeError::duplicate(err, decl.name.span))?;
        self.env.bind(&decl.name.name, Value::Func(function));

        Ok(Exec::Normal(Value::Null))
    }

    /// Resolve parameter and return types (with the type parameters in
    /// scope) and build the callable plus its function symbol. The
    /// function captures the environment current at this point.
    pub(crate) fn build_function(
        &mut self,
        name: Option<String>,
        type_params: &[Ident],
        params: &[Param],
        returns: &[TypeExpr],
        body: &BlockStmt,
        span: Span,
    ) -> Result<(Rc<Function>, FuncSymbol), RuntimeError> {
        self.push_child_env();
        let resolved = self.resolve_signature(type_params, params, returns, span);
        self.pop_env();
        let (params, returns) = resolved?;

        let type_params = type_params
            .iter()
            .map(|param| param.name.clone())
            .collect::<Vec<_>>();

        let symbol = FuncSymbol {
            name: name.clone().unwrap_or_default(),
            params: params.clone(),
            returns,
            type_params: type_params.clone(),
        };

        let function = Rc::new(Function::User(UserFunction {
            name,
            params,
            type_params,
            body: Rc::new(body.clone()),
            env: self.env.clone(),
        }));

        Ok((function, symbol))
    }

    fn resolve_signature(
        &mut self,
        type_params: &[Ident],
        params: &[Param],
        returns: &[TypeExpr],
        span: Span,
    ) -> Result<(Vec<ParamSymbol>, Vec<Arc<TypeSymbol>>), RuntimeError> {
        for type_param in type_params {
            self.env
                .define_type_param(TypeParamSymbol {
                    name: type_param.name.clone(),
                })
                .map_err(|err| RuntimeError::duplicate(err, span))?;
        }

        let params = params
            .iter()
            .map(|param| {
                Ok(ParamSymbol {
                    name: param.name.name.clone(),
                    ty: self.resolve_type_expr(&param.type_expr)?,
                })
            })
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        let returns = returns
            .iter()
            .map(|type_expr| self.resolve_type_expr(type_expr))
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        Ok((params, returns))
    }

    fn execute_struct_decl(&mut self, decl: &StructStmt) -> ExecResult {
        debug!("declaring struct '{}'", decl.name.name);

        self.push_child_env();
        let fields = self.resolve_struct_fields(decl);
        self.pop_env();
        let fields = fields?;

        let type_params = decl
            .type_params
            .iter()
            .map(|param| param.name.clone())
            .collect::<Vec<_>>();

        let symbol = Arc::new(TypeSymbol {
            name: decl.name.name.clone(),
            kind: TypeKind::Struct,
            fields,
            is_generic: !type_params.is_empty(),
            type_params,
            type_args: vec![],
            origin: None,
        });

        self.env
            .define_type(symbol)
            .map_err(|err| RuntimeError::duplicate(err, decl.name.span))?;

        if !decl.methods.is_empty() {
            self.push_child_env();
            let table = self.build_method_table(decl);
            self.pop_env();
            self.methods.insert(decl.name.name.clone(), table?);
        }

        Ok(Exec::Normal(Value::Null))
    }

    fn resolve_struct_fields(
        &mut self,
        decl: &StructStmt,
    ) -> Result<IndexMap<String, Arc<TypeSymbol>>, RuntimeError> {
        for type_param in &decl.type_params {
            self.env
                .define_type_param(TypeParamSymbol {
                    name: type_param.name.clone(),
                })
                .map_err(|err| RuntimeError::duplicate(err, type_param.span))?;
        }

        let mut fields = IndexMap::new();
        for field in &decl.fields {
            let ty = self.resolve_type_expr(&field.type_expr)?;
            if fields.insert(field.name.name.clone(), ty).is_some() {
                return Err(RuntimeError::duplicate(
                    crate::symtable::DefineError {
                        kind: crate::symtable::SymbolKind::Var,
                        name: field.name.name.clone(),
                    },
                    field.name.span,
                ));
            }
        }
        Ok(fields)
    }

    /// Methods capture an environment that has the struct's type
    /// parameters in scope; instantiations share the origin's table.
    fn build_method_table(
        &mut self,
        decl: &StructStmt,
    ) -> Result<IndexMap<String, Rc<Function>>, RuntimeError> {
        for type_param in &decl.type_params {
            self.env
                .define_type_param(TypeParamSymbol {
                    name: type_param.name.clone(),
                })
                .map_err(|err| RuntimeError::duplicate(err, type_param.span))?;
        }

        let mut table = IndexMap::new();
        for method in &decl.methods {
            let (function, _) = self.build_function(
                Some(method.name.name.clone()),
                &method.type_params,
                &method.params,
                &method.returns,
                &method.body,
                method.span,
            )?;
            if table.insert(method.name.name.clone(), function).is_some() {
                return Err(RuntimeError::duplicate(
                    crate::symtable::DefineError {
                        kind: crate::symtable::SymbolKind::Func,
                        name: method.name.name.clone(),
                    },
                    method.name.span,
                ));
            }
        }
        Ok(table)
    }

    pub(crate) fn method(&self, type_key: &str, name: &str) -> Option<Rc<Function>> {
        self.methods
            .get(type_key)
            .and_then(|table| table.get(name))
            .cloned()
    }

    // type resolution -----------------------------------------------------

    /// Resolve a syntactic type reference against the current scope:
    /// type parameters first, then the type namespace; generic types are
    /// instantiated (memoized) when arguments are given.
    pub(crate) fn resolve_type_expr(
        &mut self,
        type_expr: &TypeExpr,
    ) -> Result<Arc<TypeSymbol>, RuntimeError> {
        if self.env.lookup_type_param(&type_expr.name).is_some() {
            if !type_expr.args.is_empty() {
                return Err(RuntimeError::NotGeneric {
                    name: type_expr.name.clone(),
                    span: type_expr.span,
                });
            }
            return Ok(Arc::new(TypeSymbol::param(&type_expr.name)));
        }

        let Some(base) = self.env.lookup_type(&type_expr.name) else {
            return Err(RuntimeError::UndefinedType {
                name: type_expr.name.clone(),
                span: type_expr.span,
            });
        };

        if type_expr.args.is_empty() {
            if base.is_generic {
                return Err(RuntimeError::MissingTypeArguments {
                    name: base.name.clone(),
                    span: type_expr.span,
                });
            }
            return Ok(base);
        }

        if !base.is_generic {
            return Err(RuntimeError::NotGeneric {
                name: base.name.clone(),
                span: type_expr.span,
            });
        }
        if base.type_params.len() != type_expr.args.len() {
            return Err(RuntimeError::TypeArgumentMismatch {
                name: base.name.clone(),
                expected: base.type_params.len(),
                found: type_expr.args.len(),
                span: type_expr.span,
            });
        }

        let args = type_expr
            .args
            .iter()
            .map(|arg| self.resolve_type_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(registry::instantiate_generic(&base, &args))
    }

    // output --------------------------------------------------------------

    fn write_line(&mut self, value: &Value) -> Result<(), RuntimeError> {
        writeln!(self.output, "{value}").map_err(|err| RuntimeError::Io {
            message: err.to_string(),
        })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
