//! Expression evaluator.
//!
//! Walks the expression tree from `sinopia_armature` against an [`Env`].
//! Reads go through the reactive getters, so evaluating inside a watcher
//! records the watcher's deps.

use std::cell::RefCell;
use std::rc::Rc;

use sinopia_armature::expression::{
    parse_expression, parse_params, parse_statements, AssignOp, Expr, FunctionBody, LogicalOp,
    MemberProperty, Pattern, Property, PropertyKey, Stmt, UnaryOp, UpdateOp,
};
use sinopia_carton::{format_compact, FxHashMap, String};
use sinopia_tempera::{ReactiveArray, ReactiveObject, Value};

use crate::builtins::{array_element, call, method, native};
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::ops::{self, array_index, binary, property_key, to_number, type_of};

// ============================================================================
// Parse cache
// ============================================================================

thread_local! {
    static EXPRESSIONS: RefCell<FxHashMap<String, Rc<Expr>>> = RefCell::new(FxHashMap::default());
    static STATEMENTS: RefCell<FxHashMap<String, Rc<Vec<Stmt>>>> = RefCell::new(FxHashMap::default());
    static PARAMS: RefCell<FxHashMap<String, Rc<Vec<Pattern>>>> = RefCell::new(FxHashMap::default());
}

fn syntax_error(source: &str, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        expression: String::from(source),
        message: message.into(),
    }
}

fn cached<T>(
    cache: &'static std::thread::LocalKey<RefCell<FxHashMap<String, Rc<T>>>>,
    source: &str,
    parse: impl FnOnce(&str) -> Result<T, sinopia_armature::expression::ParseError>,
) -> EvalResult<Rc<T>> {
    if let Some(hit) = cache.with(|c| c.borrow().get(source).cloned()) {
        return Ok(hit);
    }
    let parsed = Rc::new(parse(source).map_err(|e| syntax_error(source, e.message))?);
    cache.with(|c| c.borrow_mut().insert(String::from(source), Rc::clone(&parsed)));
    Ok(parsed)
}

/// Parse an expression source once per thread.
pub fn parse_cached(source: &str) -> EvalResult<Rc<Expr>> {
    cached(&EXPRESSIONS, source, parse_expression)
}

/// Parse a parameter list once per thread.
pub fn params_cached(source: &str) -> EvalResult<Rc<Vec<Pattern>>> {
    cached(&PARAMS, source, parse_params)
}

/// Evaluate an expression source.
pub fn eval_source(source: &str, env: &Env) -> EvalResult<Value> {
    let expr = parse_cached(source)?;
    evaluate(&expr, env)
}

/// Run a statement list source, returning what it `return`s.
pub fn exec_source(source: &str, env: &Env) -> EvalResult<Value> {
    let stmts = cached(&STATEMENTS, source, parse_statements)?;
    Ok(match exec_block(&stmts, env)? {
        Flow::Return(value) => value,
        Flow::Normal(_) => Value::Undefined,
    })
}

// ============================================================================
// Expressions
// ============================================================================

/// Evaluate `expr` in `env`.
pub fn evaluate(expr: &Expr, env: &Env) -> EvalResult<Value> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Template { quasis, exprs } => {
            let mut out = std::string::String::new();
            for (i, quasi) in quasis.iter().enumerate() {
                out.push_str(quasi);
                if let Some(expr) = exprs.get(i) {
                    out.push_str(&evaluate(expr, env)?.to_string());
                }
            }
            Ok(Value::String(out.into()))
        }
        Expr::Regex { pattern, flags } => Err(EvalError::Unsupported(format_compact!(
            "regular expression /{}/{}",
            pattern,
            flags
        ))),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::This => Ok(env.this().clone()),
        Expr::Ident(name) => Ok(env.resolve(name)),
        Expr::Array(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    None => items.push(Value::Undefined),
                    Some(Expr::Spread(inner)) => items.extend(spread(&evaluate(inner, env)?)?),
                    Some(expr) => items.push(evaluate(expr, env)?),
                }
            }
            Ok(Value::from(items))
        }
        Expr::Object(properties) => {
            let obj = ReactiveObject::new();
            for property in properties {
                match property {
                    Property::KeyValue { key, value } => {
                        let key = match key {
                            PropertyKey::Static(name) => name.clone(),
                            PropertyKey::Computed(expr) => property_key(&evaluate(expr, env)?),
                        };
                        obj.insert_plain(&key, evaluate(value, env)?);
                    }
                    Property::Spread(expr) => match evaluate(expr, env)? {
                        Value::Object(source) => {
                            for key in source.keys() {
                                obj.insert_plain(&key, source.get(&key));
                            }
                        }
                        Value::Array(source) => {
                            for (i, item) in source.to_vec().into_iter().enumerate() {
                                obj.insert_plain(&format_compact!("{}", i), item);
                            }
                        }
                        _ => {}
                    },
                }
            }
            Ok(Value::Object(obj))
        }
        Expr::Spread(_) => Err(EvalError::type_error("Unexpected spread")),
        Expr::Member { .. } | Expr::Call { .. } => Ok(eval_chain(expr, env)?.unwrap_or_default()),
        Expr::New { .. } => Err(EvalError::Unsupported("new".into())),
        Expr::Unary { op, argument } => unary(*op, argument, env),
        Expr::Update {
            op,
            prefix,
            argument,
        } => {
            let old = to_number(&evaluate(argument, env)?);
            let new = match op {
                UpdateOp::Increment => old + 1.0,
                UpdateOp::Decrement => old - 1.0,
            };
            assign(argument, Value::Number(new), env)?;
            Ok(Value::Number(if *prefix { new } else { old }))
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, env)?;
            if short_circuits(*op, &left) {
                Ok(left)
            } else {
                evaluate(right, env)
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, env)?.is_truthy() {
                evaluate(consequent, env)
            } else {
                evaluate(alternate, env)
            }
        }
        Expr::Assign { op, target, value } => match op {
            AssignOp::Assign => {
                let value = evaluate(value, env)?;
                assign(target, value.clone(), env)?;
                Ok(value)
            }
            AssignOp::Binary(op) => {
                let current = evaluate(target, env)?;
                let value = binary(*op, &current, &evaluate(value, env)?)?;
                assign(target, value.clone(), env)?;
                Ok(value)
            }
            AssignOp::Logical(op) => {
                let current = evaluate(target, env)?;
                if short_circuits(*op, &current) {
                    return Ok(current);
                }
                let value = evaluate(value, env)?;
                assign(target, value.clone(), env)?;
                Ok(value)
            }
        },
        Expr::Sequence(exprs) => {
            let mut last = Value::Undefined;
            for expr in exprs {
                last = evaluate(expr, env)?;
            }
            Ok(last)
        }
        Expr::Function {
            params,
            body,
            arrow,
        } => Ok(function(params, body, *arrow, env)),
    }
}

fn short_circuits(op: LogicalOp, left: &Value) -> bool {
    match op {
        LogicalOp::And => !left.is_truthy(),
        LogicalOp::Or => left.is_truthy(),
        LogicalOp::Nullish => !left.is_nullish(),
    }
}

fn spread(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::Array(arr) => Ok(arr.to_vec()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(format_compact!("{}", c))).collect()),
        other => Err(EvalError::type_error(format_compact!("{} is not iterable", other))),
    }
}

fn unary(op: UnaryOp, argument: &Expr, env: &Env) -> EvalResult<Value> {
    match op {
        UnaryOp::TypeOf => {
            // typeof tolerates undeclared names
            let value = match argument {
                Expr::Ident(name) => env.lookup(name).unwrap_or_default(),
                other => evaluate(other, env)?,
            };
            Ok(Value::from(type_of(&value)))
        }
        UnaryOp::Delete => {
            if let Expr::Member {
                object, property, ..
            } = argument
            {
                let target = evaluate(object, env)?;
                let key = member_key(property, env)?;
                match &target {
                    Value::Object(obj) => {
                        obj.remove(&key);
                    }
                    Value::Array(arr) => {
                        if let Some(index) = array_index(&key).filter(|i| *i < arr.snapshot().len()) {
                            arr.set_plain(index, Value::Undefined);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Value::Bool(true))
        }
        UnaryOp::Void => {
            evaluate(argument, env)?;
            Ok(Value::Undefined)
        }
        UnaryOp::Not => Ok(Value::Bool(!evaluate(argument, env)?.is_truthy())),
        UnaryOp::Minus => Ok(Value::Number(-to_number(&evaluate(argument, env)?))),
        UnaryOp::Plus => Ok(Value::Number(to_number(&evaluate(argument, env)?))),
        UnaryOp::BitNot => Ok(Value::Number(f64::from(!ops::to_int32(&evaluate(
            argument, env,
        )?)))),
    }
}

fn member_key(property: &MemberProperty, env: &Env) -> EvalResult<String> {
    match property {
        MemberProperty::Static(name) => Ok(name.clone()),
        MemberProperty::Computed(expr) => Ok(property_key(&evaluate(expr, env)?)),
    }
}

/// Evaluate a member/call chain. `None` means an optional link
/// short-circuited the rest of the chain.
fn eval_chain(expr: &Expr, env: &Env) -> EvalResult<Option<Value>> {
    match expr {
        Expr::Member {
            object,
            property,
            optional,
        } => {
            let Some(target) = eval_chain(object, env)? else {
                return Ok(None);
            };
            if *optional && target.is_nullish() {
                return Ok(None);
            }
            let key = member_key(property, env)?;
            get_member(&target, &key).map(Some)
        }
        Expr::Call {
            callee,
            args,
            optional,
        } => {
            let Some(function) = eval_chain(callee, env)? else {
                return Ok(None);
            };
            if *optional && function.is_nullish() {
                return Ok(None);
            }
            let args = eval_args(args, env)?;
            call(&function, &args, &callee_name(callee)).map(Some)
        }
        other => evaluate(other, env).map(Some),
    }
}

fn eval_args(args: &[Expr], env: &Env) -> EvalResult<Vec<Value>> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Expr::Spread(inner) => values.extend(spread(&evaluate(inner, env)?)?),
            other => values.push(evaluate(other, env)?),
        }
    }
    Ok(values)
}

fn callee_name(callee: &Expr) -> std::string::String {
    match callee {
        Expr::Ident(name) => name.to_string(),
        Expr::This => "this".into(),
        Expr::Member {
            object,
            property: MemberProperty::Static(name),
            ..
        } => format!("{}.{}", callee_name(object), name),
        Expr::Member { object, .. } => format!("{}[...]", callee_name(object)),
        Expr::Call { callee, .. } => format!("{}(...)", callee_name(callee)),
        _ => "expression".into(),
    }
}

/// `target[key]`.
pub fn get_member(target: &Value, key: &str) -> EvalResult<Value> {
    match target {
        Value::Undefined | Value::Null => Err(EvalError::type_error(format_compact!(
            "Cannot read properties of {} (reading '{}')",
            target,
            key
        ))),
        Value::Object(obj) => {
            if obj.contains_key(key) {
                Ok(obj.get(key))
            } else {
                Ok(method(target, key).unwrap_or_default())
            }
        }
        Value::Array(arr) => {
            if key == "length" {
                return Ok(Value::from(arr.len()));
            }
            if let Some(item) = array_element(arr, key) {
                return Ok(item);
            }
            Ok(method(target, key).unwrap_or_default())
        }
        Value::String(s) => {
            if key == "length" {
                return Ok(Value::from(s.chars().count()));
            }
            if let Some(index) = array_index(key) {
                return Ok(s
                    .chars()
                    .nth(index)
                    .map(|c| Value::String(format_compact!("{}", c)))
                    .unwrap_or_default());
            }
            Ok(method(target, key).unwrap_or_default())
        }
        Value::Number(_) => Ok(method(target, key).unwrap_or_default()),
        Value::Bool(_) | Value::Function(_) => Ok(Value::Undefined),
    }
}

/// `target[key] = value`.
///
/// Objects go through the reactive setter; keys they do not have yet are
/// added as plain properties. Writing an array index directly does not
/// notify, as in the browser runtime; `$set` does.
pub fn set_member(target: &Value, key: &str, value: Value) -> EvalResult<()> {
    match target {
        Value::Object(obj) => {
            obj.assign(key, value);
            Ok(())
        }
        Value::Array(arr) => match array_index(key) {
            Some(index) => {
                arr.set_plain(index, value);
                Ok(())
            }
            None if key == "length" => {
                let len = to_number(&value);
                let current = arr.snapshot().len();
                if len.is_finite() && len >= 0.0 && (len as usize) < current {
                    arr.splice(len as usize, current - len as usize, Vec::new());
                }
                Ok(())
            }
            None => Ok(()),
        },
        Value::Undefined | Value::Null => Err(EvalError::type_error(format_compact!(
            "Cannot set properties of {} (setting '{}')",
            target,
            key
        ))),
        _ => Ok(()),
    }
}

fn assign(target: &Expr, value: Value, env: &Env) -> EvalResult<()> {
    match target {
        Expr::Ident(name) => {
            env.assign(name, value);
            Ok(())
        }
        Expr::Member {
            object, property, ..
        } => {
            let object = evaluate(object, env)?;
            let key = member_key(property, env)?;
            set_member(&object, &key, value)
        }
        _ => Err(EvalError::Thrown(
            "SyntaxError: Invalid left-hand side in assignment".into(),
        )),
    }
}

// ============================================================================
// Functions and patterns
// ============================================================================

fn function(params: &[Pattern], body: &FunctionBody, arrow: bool, env: &Env) -> Value {
    let params: Rc<[Pattern]> = Rc::from(params.to_vec());
    let body = Rc::new(body.clone());
    let env = env.clone();
    native(move |args| {
        let scope = env.child();
        if !arrow {
            scope.define("arguments", Value::from(args.to_vec()));
        }
        bind_params(&params, args, &scope)?;
        match &*body {
            FunctionBody::Expr(expr) => evaluate(expr, &scope),
            FunctionBody::Block(stmts) => Ok(match exec_block(stmts, &scope)? {
                Flow::Return(value) => value,
                Flow::Normal(_) => Value::Undefined,
            }),
        }
    })
}

/// Bind call arguments to a parameter list.
pub fn bind_params(params: &[Pattern], args: &[Value], env: &Env) -> EvalResult<()> {
    for (i, param) in params.iter().enumerate() {
        match param {
            Pattern::Rest(target) => {
                let rest = args.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                bind_pattern(target, Value::from(rest), env)?;
            }
            other => bind_pattern(other, args.get(i).cloned().unwrap_or_default(), env)?,
        }
    }
    Ok(())
}

/// Destructure `value` into `pattern`, declaring the names in `env`.
pub fn bind_pattern(pattern: &Pattern, value: Value, env: &Env) -> EvalResult<()> {
    match pattern {
        Pattern::Ident(name) => {
            env.define(name, value);
            Ok(())
        }
        Pattern::Default { target, value: default } => {
            let value = match value {
                Value::Undefined => evaluate(default, env)?,
                value => value,
            };
            bind_pattern(target, value, env)
        }
        Pattern::Rest(target) => bind_pattern(target, value, env),
        Pattern::Object { properties, rest } => {
            let mut used = Vec::with_capacity(properties.len());
            for (key, target) in properties {
                let key = match key {
                    PropertyKey::Static(name) => name.clone(),
                    PropertyKey::Computed(expr) => property_key(&evaluate(expr, env)?),
                };
                bind_pattern(target, get_member(&value, &key)?, env)?;
                used.push(key);
            }
            if let Some(rest) = rest {
                let remaining = ReactiveObject::new();
                if let Value::Object(obj) = &value {
                    for (key, item) in obj.snapshot() {
                        if !used.contains(&key) {
                            remaining.insert_plain(&key, item);
                        }
                    }
                }
                bind_pattern(rest, Value::Object(remaining), env)?;
            }
            Ok(())
        }
        Pattern::Array { elements, rest } => {
            let items = spread(&value)?;
            for (i, element) in elements.iter().enumerate() {
                if let Some(element) = element {
                    bind_pattern(element, items.get(i).cloned().unwrap_or_default(), env)?;
                }
            }
            if let Some(rest) = rest {
                let tail = items.get(elements.len()..).map(<[Value]>::to_vec).unwrap_or_default();
                bind_pattern(rest, Value::Array(ReactiveArray::from_vec(tail)), env)?;
            }
            Ok(())
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

pub fn exec_block(stmts: &[Stmt], env: &Env) -> EvalResult<Flow> {
    let mut last = Value::Undefined;
    for stmt in stmts {
        match exec(stmt, env)? {
            Flow::Normal(value) => last = value,
            flow @ Flow::Return(_) => return Ok(flow),
        }
    }
    Ok(Flow::Normal(last))
}

fn exec(stmt: &Stmt, env: &Env) -> EvalResult<Flow> {
    match stmt {
        Stmt::Expr(expr) => evaluate(expr, env).map(Flow::Normal),
        Stmt::Return(expr) => Ok(Flow::Return(match expr {
            Some(expr) => evaluate(expr, env)?,
            None => Value::Undefined,
        })),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, env)?.is_truthy() {
                exec(consequent, env)
            } else if let Some(alternate) = alternate {
                exec(alternate, env)
            } else {
                Ok(Flow::Normal(Value::Undefined))
            }
        }
        Stmt::Block(stmts) => exec_block(stmts, &env.child()),
        Stmt::Declare { declarations, .. } => {
            for (pattern, init) in declarations {
                let value = match init {
                    Some(expr) => evaluate(expr, env)?,
                    None => Value::Undefined,
                };
                bind_pattern(pattern, value, env)?;
            }
            Ok(Flow::Normal(Value::Undefined))
        }
        Stmt::Throw(expr) => Err(EvalError::Thrown(format_compact!("{}", evaluate(expr, env)?))),
        Stmt::Empty => Ok(Flow::Normal(Value::Undefined)),
    }
}
