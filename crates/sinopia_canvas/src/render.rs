//! Interpreting render code.
//!
//! The compiler's render IR ([`Code`]) is evaluated in two positions:
//! node position, where `_c`, `_v`, `_e`, `_l`, `_m`, `_o` and `_t`
//! produce [`VNode`]s, and value position, where everything else produces
//! [`Value`]s (data objects, helper calls, template expressions).

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use sinopia_carton::{format_compact, FxHashMap, String};
use sinopia_relief::{Code, Guard, Helper, HandlerBody, HandlerCode, KeyFilter};
use sinopia_tempera::{warn, Callable, ReactiveObject, Value, Watcher};

use crate::builtins::{arg, call, native};
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::eval::{bind_params, eval_source, exec_source, get_member, params_cached};
use crate::helpers::{self, bind_object_listeners, bind_object_props, check_key_codes};
use crate::ops::to_number;
use crate::vnode::{CompiledSlot, VNode, VNodeData};

/// Content a host passes into a render scope's `<slot>` outlets.
#[derive(Clone)]
pub enum SlotContent {
    Nodes(Vec<VNode>),
    /// Receives the slot props object.
    Scoped(Rc<dyn Fn(&Value) -> Vec<VNode>>),
}

impl fmt::Debug for SlotContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotContent::Nodes(nodes) => f.debug_tuple("Nodes").field(nodes).finish(),
            SlotContent::Scoped(_) => f.write_str("Scoped"),
        }
    }
}

const MULTIPLE_ROOTS: &str =
    "Multiple root nodes returned from render function. Render function should return a single root node.";

/// Everything one compiled template needs to render: its code, the state
/// it renders, the root scope and the static tree cache.
pub struct RenderContext {
    state: ReactiveObject,
    env: Env,
    render_code: Code,
    static_render_code: Vec<Code>,
    static_trees: RefCell<Vec<Option<VNode>>>,
    slots: FxHashMap<String, SlotContent>,
}

impl RenderContext {
    pub fn new(
        render_code: Code,
        static_render_code: Vec<Code>,
        state: ReactiveObject,
        slots: FxHashMap<String, SlotContent>,
        filters: FxHashMap<String, Callable>,
    ) -> Self {
        let env = Env::root(Value::Object(state.clone()));
        helpers::install(&env);
        env.define(
            Helper::ResolveFilter.name(),
            native(move |args| {
                let name = arg(args, 0).to_string();
                Ok(match filters.get(name.as_str()) {
                    Some(filter) => Value::Function(filter.clone()),
                    None => {
                        warn(&format!("Failed to resolve filter: {}", name));
                        native(|args| Ok(arg(args, 0)))
                    }
                })
            }),
        );
        let static_trees = RefCell::new(vec![None; static_render_code.len()]);
        Self {
            state,
            env,
            render_code,
            static_render_code,
            static_trees,
            slots,
        }
    }

    pub fn state(&self) -> &ReactiveObject {
        &self.state
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Expose `$forceUpdate` for the watcher that renders this context.
    pub fn bind_watcher(&self, watcher: Weak<Watcher>) {
        self.env.define(
            "$forceUpdate",
            native(move |_| {
                if let Some(watcher) = watcher.upgrade() {
                    watcher.update();
                }
                Ok(Value::Undefined)
            }),
        );
    }

    /// Render the root node. The root must be a single node; anything else
    /// warns and renders an empty node.
    pub fn render(&self) -> EvalResult<VNode> {
        let mut nodes = Vec::new();
        self.collect(&self.render_code, &self.env, &mut nodes)?;
        match nodes.len() {
            0 => Ok(VNode::empty("")),
            1 => Ok(nodes.remove(0)),
            _ => {
                warn(MULTIPLE_ROOTS);
                Ok(VNode::empty(""))
            }
        }
    }

    /// Render a compiled scoped slot with `props`.
    pub fn render_scoped_slot(&self, slot: &CompiledSlot, props: &Value) -> EvalResult<Vec<VNode>> {
        let scope = slot.env.child();
        let params = params_cached(&slot.params)?;
        bind_params(&params, std::slice::from_ref(props), &scope)?;
        let mut nodes = Vec::new();
        self.collect(&slot.body, &scope, &mut nodes)?;
        Ok(nodes)
    }

    // ========================================================================
    // Node position
    // ========================================================================

    fn collect(&self, code: &Code, env: &Env, out: &mut Vec<VNode>) -> EvalResult<()> {
        match code {
            Code::Call(helper, args) => match helper {
                Helper::CreateElement => out.push(self.create_element(args, env)?),
                Helper::CreateText => {
                    let text = match args.first() {
                        Some(code) => value(code, env)?.to_string(),
                        None => std::string::String::new(),
                    };
                    out.push(VNode::text(text));
                }
                Helper::CreateEmpty => {
                    let text = match args.first() {
                        Some(code) => value(code, env)?.to_string(),
                        None => std::string::String::new(),
                    };
                    out.push(VNode::empty(text));
                }
                Helper::RenderList => self.render_list(args, env, out)?,
                Helper::RenderStatic => out.push(self.render_static(args)?),
                Helper::MarkOnce => self.mark_once(args, env, out)?,
                Helper::RenderSlot => self.render_slot(args, env, out)?,
                _ => push_value(value(code, env)?, out),
            },
            Code::Array(items) => {
                for item in items {
                    self.collect(item, env, out)?;
                }
            }
            Code::Cond {
                test,
                consequent,
                alternate,
            } => {
                let branch = if eval_source(test, env)?.is_truthy() {
                    consequent
                } else {
                    alternate
                };
                self.collect(branch, env, out)?;
            }
            Code::Paren(inner) => self.collect(inner, env, out)?,
            Code::Null | Code::Undefined | Code::Void => {}
            other => push_value(value(other, env)?, out),
        }
        Ok(())
    }

    fn create_element(&self, args: &[Code], env: &Env) -> EvalResult<VNode> {
        let tag = match args.first() {
            Some(Code::TagName(tag) | Code::Str(tag)) => tag.clone(),
            Some(dynamic) => match value(dynamic, env)? {
                Value::Undefined | Value::Null => return Ok(VNode::empty("")),
                other => format_compact!("{}", other),
            },
            None => return Ok(VNode::empty("")),
        };
        let mut rest = args.get(1..).unwrap_or_default();
        let data = match rest.first() {
            Some(code) if is_data(code) => {
                rest = &rest[1..];
                Some(self.data(code, env)?)
            }
            _ => None,
        };
        let mut children = Vec::new();
        if let Some(code) = rest.first() {
            self.collect(code, env, &mut children)?;
        }
        Ok(VNode::element(tag, data, children))
    }

    fn render_list(&self, args: &[Code], env: &Env, out: &mut Vec<VNode>) -> EvalResult<()> {
        let source = match args.first() {
            Some(code) => value(code, env)?,
            None => return Ok(()),
        };
        let Some(Code::Func { params, body }) = args.get(1) else {
            return Err(EvalError::Unsupported("_l without an item function".into()));
        };
        let params = params_cached(params)?;
        for_each_item(&source, |item_args| {
            let scope = env.child();
            bind_params(&params, &item_args, &scope)?;
            self.collect(body, &scope, out)
        })
    }

    fn render_static(&self, args: &[Code]) -> EvalResult<VNode> {
        let index = match args.first() {
            Some(Code::Int(i)) => *i as usize,
            _ => 0,
        };
        let in_for = matches!(args.get(1), Some(Code::Bool(true)));
        if !in_for {
            if let Some(Some(tree)) = self.static_trees.borrow().get(index) {
                return Ok(tree.clone());
            }
        }
        let Some(code) = self.static_render_code.get(index) else {
            return Err(EvalError::Unsupported(format_compact!("missing static tree {}", index)));
        };
        let mut nodes = Vec::new();
        self.collect(code, &self.env, &mut nodes)?;
        let mut tree = nodes.into_iter().next().unwrap_or_else(|| VNode::empty(""));
        mark_static(&mut tree, &format_compact!("__static__{}", index), false);
        if !in_for {
            if let Some(slot) = self.static_trees.borrow_mut().get_mut(index) {
                *slot = Some(tree.clone());
            }
        }
        Ok(tree)
    }

    fn mark_once(&self, args: &[Code], env: &Env, out: &mut Vec<VNode>) -> EvalResult<()> {
        let start = out.len();
        if let Some(code) = args.first() {
            self.collect(code, env, out)?;
        }
        let id = args.get(1).map(|code| value(code, env)).transpose()?.unwrap_or_default();
        let key = args.get(2).map(|code| value(code, env)).transpose()?.unwrap_or_default();
        let key = if key.is_truthy() {
            format_compact!("__once__{}_{}", id, key)
        } else {
            format_compact!("__once__{}", id)
        };
        for node in &mut out[start..] {
            mark_static(node, &key, true);
        }
        Ok(())
    }

    fn render_slot(&self, args: &[Code], env: &Env, out: &mut Vec<VNode>) -> EvalResult<()> {
        let name = match args.first() {
            Some(code) => value(code, env)?.to_string(),
            None => "default".to_string(),
        };
        let fallback = match args.get(1) {
            Some(Code::Func { body, .. }) => Some(body.as_ref()),
            _ => None,
        };
        let props = ReactiveObject::new();
        for code in [args.get(2), args.get(3)].into_iter().flatten() {
            if let Value::Object(obj) = value(code, env)? {
                for (key, value) in obj.snapshot() {
                    props.insert_plain(&key, value);
                }
            }
        }
        let nodes = match self.slots.get(name.as_str()) {
            Some(SlotContent::Scoped(render)) => render(&Value::Object(props)),
            Some(SlotContent::Nodes(nodes)) => nodes.clone(),
            None => Vec::new(),
        };
        if !nodes.is_empty() {
            out.extend(nodes);
        } else if let Some(fallback) = fallback {
            self.collect(fallback, env, out)?;
        }
        Ok(())
    }

    // ========================================================================
    // Element data
    // ========================================================================

    fn data(&self, code: &Code, env: &Env) -> EvalResult<VNodeData> {
        match code {
            Code::Object(entries) => {
                let fields = ReactiveObject::new();
                let mut scoped_slots = Vec::new();
                for (key, code) in entries {
                    if key.as_str() == "scopedSlots" {
                        if let Code::Call(Helper::ResolveScopedSlots, args) = code {
                            if let Some(slots) = args.first() {
                                collect_slots(slots, env, &mut scoped_slots)?;
                            }
                            continue;
                        }
                    }
                    fields.insert_plain(key.as_str(), value(code, env)?);
                }
                Ok(VNodeData {
                    fields,
                    scoped_slots,
                })
            }
            Code::Call(Helper::BindObjectProps, args) => {
                let data = self.data_arg(args, env)?;
                let tag = args.get(1).map(|code| value(code, env)).transpose()?.unwrap_or_default();
                let bound = args.get(2).map(|code| value(code, env)).transpose()?.unwrap_or_default();
                let as_prop = matches!(args.get(3), Some(Code::Bool(true)));
                let is_sync = matches!(args.get(4), Some(Code::Bool(true)));
                bind_object_props(&data.fields, &tag.to_string(), &bound, as_prop, is_sync);
                Ok(data)
            }
            Code::Call(Helper::BindObjectListeners, args) => {
                let data = self.data_arg(args, env)?;
                let listeners = args.get(1).map(|code| value(code, env)).transpose()?.unwrap_or_default();
                bind_object_listeners(&data.fields, &listeners);
                Ok(data)
            }
            other => Ok(match value(other, env)? {
                Value::Object(fields) => VNodeData::new(fields),
                _ => VNodeData::default(),
            }),
        }
    }

    fn data_arg(&self, args: &[Code], env: &Env) -> EvalResult<VNodeData> {
        match args.first() {
            Some(code) => self.data(code, env),
            None => Ok(VNodeData::default()),
        }
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("state", &self.state)
            .field("static_trees", &self.static_render_code.len())
            .finish()
    }
}

fn is_data(code: &Code) -> bool {
    matches!(
        code,
        Code::Object(_) | Code::Call(Helper::BindObjectProps | Helper::BindObjectListeners, _)
    )
}

fn push_value(value: Value, out: &mut Vec<VNode>) {
    match value {
        Value::Undefined | Value::Null => {}
        Value::Array(items) => {
            for item in items.to_vec() {
                push_value(item, out);
            }
        }
        other => out.push(VNode::text(format_compact!("{}", other))),
    }
}

fn mark_static(node: &mut VNode, key: &str, is_once: bool) {
    node.is_static = true;
    node.is_once = is_once;
    node.key = Some(Value::from(key));
}

/// Call `visit` with the `(item, key, index)` arguments `v-for` binds for
/// each entry of `source`: array items, string characters, the integers
/// `1..=n`, or object properties.
fn for_each_item(
    source: &Value,
    mut visit: impl FnMut(Vec<Value>) -> EvalResult<()>,
) -> EvalResult<()> {
    match source {
        Value::Array(arr) => {
            for (i, item) in arr.to_vec().into_iter().enumerate() {
                visit(vec![item, Value::from(i)])?;
            }
        }
        Value::String(s) => {
            for (i, c) in s.chars().enumerate() {
                visit(vec![Value::String(format_compact!("{}", c)), Value::from(i)])?;
            }
        }
        Value::Number(n) => {
            for i in 0..n.max(0.0) as usize {
                visit(vec![Value::from(i + 1), Value::from(i)])?;
            }
        }
        Value::Object(obj) => {
            for (i, key) in obj.keys().into_iter().enumerate() {
                let item = obj.get(&key);
                visit(vec![item, Value::String(key), Value::from(i)])?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn collect_slots(code: &Code, env: &Env, out: &mut Vec<CompiledSlot>) -> EvalResult<()> {
    match code {
        Code::Array(items) => {
            for item in items {
                collect_slots(item, env, out)?;
            }
        }
        Code::Paren(inner) => collect_slots(inner, env, out)?,
        Code::Cond {
            test,
            consequent,
            alternate,
        } => {
            let branch = if eval_source(test, env)?.is_truthy() {
                consequent
            } else {
                alternate
            };
            collect_slots(branch, env, out)?;
        }
        Code::Call(Helper::RenderList, args) => {
            let source = match args.first() {
                Some(code) => value(code, env)?,
                None => return Ok(()),
            };
            if let Some(Code::Func { params, body }) = args.get(1) {
                let params = params_cached(params)?;
                for_each_item(&source, |item_args| {
                    let scope = env.child();
                    bind_params(&params, &item_args, &scope)?;
                    collect_slots(body, &scope, out)
                })?;
            }
        }
        Code::Object(entries) => {
            let mut slot = None;
            let mut key = String::default();
            let mut proxy = false;
            for (name, code) in entries {
                match (name.as_str(), code) {
                    ("key", code) => key = format_compact!("{}", value(code, env)?),
                    ("fn", Code::Func { params, body }) => slot = Some((params.clone(), body.as_ref().clone())),
                    ("proxy", Code::Bool(b)) => proxy = *b,
                    _ => {}
                }
            }
            if let Some((params, body)) = slot {
                out.push(CompiledSlot {
                    key,
                    params,
                    body,
                    env: env.clone(),
                    proxy,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

// ============================================================================
// Value position
// ============================================================================

/// Evaluate render code in value position.
pub fn value(code: &Code, env: &Env) -> EvalResult<Value> {
    match code {
        Code::Expr(source) => eval_source(source, env),
        Code::Str(s) | Code::TagName(s) => Ok(Value::String(s.clone())),
        Code::Int(n) => Ok(Value::Number(*n as f64)),
        Code::Bool(b) => Ok(Value::Bool(*b)),
        Code::Null => Ok(Value::Null),
        Code::Undefined | Code::Void => Ok(Value::Undefined),
        Code::Paren(inner) => value(inner, env),
        Code::Object(entries) => {
            let obj = ReactiveObject::new();
            for (key, code) in entries {
                obj.insert_plain(key.as_str(), value(code, env)?);
            }
            Ok(Value::Object(obj))
        }
        Code::Array(items) => items
            .iter()
            .map(|item| value(item, env))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::from),
        Code::Cond {
            test,
            consequent,
            alternate,
        } => {
            if eval_source(test, env)?.is_truthy() {
                value(consequent, env)
            } else {
                value(alternate, env)
            }
        }
        Code::Call(helper, args) => call_helper(*helper, args, env),
        Code::Func { params, body } => {
            let params = params_cached(params)?;
            let body = body.as_ref().clone();
            let env = env.clone();
            Ok(native(move |args| {
                let scope = env.child();
                bind_params(&params, args, &scope)?;
                value(&body, &scope)
            }))
        }
        Code::Handler(handler) => handler_value(handler, env),
        Code::ModelCallback(assignment) => {
            let assignment = assignment.clone();
            let env = env.clone();
            Ok(native(move |args| {
                let scope = env.child();
                scope.define("$$v", arg(args, 0));
                exec_source(&assignment, &scope)?;
                Ok(Value::Undefined)
            }))
        }
        Code::RenderFn(body) => Ok(Value::String(format_compact!(
            "function(){{with(this){{return {}}}}}",
            body.to_source()
        ))),
    }
}

fn call_helper(helper: Helper, args: &[Code], env: &Env) -> EvalResult<Value> {
    match helper {
        Helper::CreateElement
        | Helper::CreateText
        | Helper::CreateEmpty
        | Helper::RenderList
        | Helper::RenderStatic
        | Helper::MarkOnce
        | Helper::RenderSlot
        | Helper::ResolveScopedSlots => Err(EvalError::Unsupported(format_compact!(
            "{} in a value position",
            helper.name()
        ))),
        _ => {
            let function = env.resolve(helper.name());
            let args = args
                .iter()
                .map(|code| value(code, env))
                .collect::<EvalResult<Vec<_>>>()?;
            call(&function, &args, helper.name())
        }
    }
}

// ============================================================================
// Listeners
// ============================================================================

fn handler_value(handler: &HandlerCode, env: &Env) -> EvalResult<Value> {
    match handler {
        HandlerCode::Direct(source) => eval_source(source, env),
        HandlerCode::Wrapped { guards, body } => {
            let guards = guards.clone();
            let body = body.clone();
            let env = env.clone();
            Ok(native(move |args| {
                let event = arg(args, 0);
                for guard in &guards {
                    if !passes(guard, &event)? {
                        return Ok(Value::Null);
                    }
                }
                let scope = env.child();
                scope.define("$event", event);
                scope.define("arguments", Value::from(args.to_vec()));
                match &body {
                    HandlerBody::MethodPath(source) | HandlerBody::FunctionExpr(source) => {
                        let function = eval_source(source, &scope)?;
                        call(&function, args, source)
                    }
                    HandlerBody::Invocation(source) => eval_source(source, &scope),
                    HandlerBody::Statement(source) => {
                        exec_source(source, &scope)?;
                        Ok(Value::Undefined)
                    }
                }
            }))
        }
    }
}

fn event_prop(event: &Value, name: &str) -> Value {
    match event {
        Value::Object(obj) => obj.get(name),
        _ => Value::Undefined,
    }
}

/// Run one modifier guard; `false` stops the listener.
fn passes(guard: &Guard, event: &Value) -> EvalResult<bool> {
    Ok(match guard {
        Guard::KeyFilter(filters) => {
            let is_key_event = event_prop(event, "type")
                .as_str()
                .is_some_and(|t| t.starts_with("key"));
            let mismatched = filters.iter().all(|filter| match filter {
                KeyFilter::Code(code) => to_number(&event_prop(event, "keyCode")) != f64::from(*code),
                KeyFilter::Alias { key, codes, names } => check_key_codes(
                    &event_prop(event, "keyCode"),
                    key,
                    codes,
                    &event_prop(event, "key"),
                    names,
                ),
            });
            !(is_key_event && mismatched)
        }
        Guard::Stop => {
            invoke_event_method(event, "stopPropagation")?;
            true
        }
        Guard::Prevent => {
            invoke_event_method(event, "preventDefault")?;
            true
        }
        Guard::SelfOnly => event_prop(event, "target").same_value(&event_prop(event, "currentTarget")),
        Guard::SystemKey(key) => event_prop(event, key.event_prop()).is_truthy(),
        Guard::Button(button) => match event {
            Value::Object(obj) if obj.contains_key("button") => {
                to_number(&obj.get("button")) == f64::from(button.index())
            }
            _ => true,
        },
        Guard::Exact(keys) => !keys
            .iter()
            .any(|key| event_prop(event, key.event_prop()).is_truthy()),
    })
}

fn invoke_event_method(event: &Value, name: &str) -> EvalResult<()> {
    if let Value::Object(_) = event {
        let method = get_member(event, name)?;
        if let Value::Function(_) = method {
            call(&method, &[], name)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_atelier_dom::compile_template;

    fn context(template: &str, state: serde_json::Value) -> RenderContext {
        let compiled = compile_template(template);
        assert!(compiled.errors.is_empty(), "{:?}", compiled.errors);
        let state = Value::from_json(&state);
        sinopia_tempera::observe_root(&state);
        RenderContext::new(
            compiled.render_code,
            compiled.static_render_code,
            state.as_object().cloned().unwrap_or_default(),
            FxHashMap::default(),
            FxHashMap::default(),
        )
    }

    fn html(template: &str, state: serde_json::Value) -> std::string::String {
        context(template, state).render().unwrap().to_html()
    }

    #[test]
    fn test_interpolation_and_bindings() {
        assert_eq!(
            html(
                "<p :title=\"t\" class=\"a\" :class=\"{ on: active }\">{{ msg | missing }} {{ n + 1 }}</p>",
                serde_json::json!({"t": "hi", "active": true, "msg": "x", "n": 1})
            ),
            "<p class=\"a on\" title=\"hi\">x 2</p>"
        );
    }

    #[test]
    fn test_conditionals() {
        let template = "<div><span v-if=\"n > 1\">big</span><span v-else-if=\"n\">one</span><i v-else>none</i></div>";
        assert_eq!(html(template, serde_json::json!({"n": 2})), "<div><span>big</span></div>");
        assert_eq!(html(template, serde_json::json!({"n": 1})), "<div><span>one</span></div>");
        assert_eq!(html(template, serde_json::json!({"n": 0})), "<div><i>none</i></div>");
        assert_eq!(
            html("<div><b v-if=\"no\">x</b></div>", serde_json::json!({"no": false})),
            "<div><!----></div>"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            html(
                "<ul><li v-for=\"(v, k, i) in obj\">{{ i }}:{{ k }}={{ v }}</li></ul>",
                serde_json::json!({"obj": {"a": 1, "b": 2}})
            ),
            "<ul><li>0:a=1</li><li>1:b=2</li></ul>"
        );
        assert_eq!(
            html("<p><span v-for=\"n in 3\">{{ n }}</span></p>", serde_json::json!({})),
            "<p><span>1</span><span>2</span><span>3</span></p>"
        );
    }

    #[test]
    fn test_static_trees_are_cached() {
        let ctx = context(
            "<div><p class=\"s\"><b>static</b></p><span>{{ n }}</span></div>",
            serde_json::json!({"n": 1}),
        );
        let first = ctx.render().unwrap();
        let hoisted = &first.children[0];
        assert!(hoisted.is_static);
        assert_eq!(hoisted.key, Some(Value::from("__static__0")));
        assert_eq!(first.to_html(), "<div><p class=\"s\"><b>static</b></p><span>1</span></div>");
        assert!(ctx.static_trees.borrow()[0].is_some());
    }

    #[test]
    fn test_v_once() {
        let ctx = context(
            "<div><p v-once>{{ n }}</p><span>{{ n }}</span></div>",
            serde_json::json!({"n": 1}),
        );
        assert_eq!(ctx.render().unwrap().to_html(), "<div><p>1</p><span>1</span></div>");
        ctx.state().assign("n", Value::from(2));
        assert_eq!(ctx.render().unwrap().to_html(), "<div><p>1</p><span>2</span></div>");

        let ctx = context(
            "<div><div v-for=\"i in list\" :key=\"i\"><p v-once>{{ i }}</p></div></div>",
            serde_json::json!({"list": [1]}),
        );
        let node = ctx.render().unwrap();
        let once = &node.children[0].children[0];
        assert!(once.is_once);
        assert_eq!(once.key, Some(Value::from("__once__0_1")));
    }

    #[test]
    fn test_slots() {
        let compiled = compile_template("<div><slot :item=\"x\">fallback</slot><slot name=\"s\"></slot></div>");
        let state = Value::from_json(&serde_json::json!({"x": "X"}));
        let mut slots = FxHashMap::default();
        slots.insert(
            String::from("default"),
            SlotContent::Scoped(Rc::new(|props: &Value| {
                let item = props.as_object().map(|p| p.get("item")).unwrap_or_default();
                vec![VNode::text(format_compact!("got {}", item))]
            })),
        );
        let ctx = RenderContext::new(
            compiled.render_code,
            compiled.static_render_code,
            state.as_object().cloned().unwrap_or_default(),
            slots,
            FxHashMap::default(),
        );
        assert_eq!(ctx.render().unwrap().to_html(), "<div>got X</div>");

        assert_eq!(
            html("<div><slot>fallback</slot></div>", serde_json::json!({})),
            "<div>fallback</div>"
        );
    }

    #[test]
    fn test_handlers_and_modifiers() {
        let ctx = context(
            "<div><button @click.stop=\"count++\" @keyup.enter=\"submit\">+</button></div>",
            serde_json::json!({"count": 0, "submitted": 0}),
        );
        let submit_state = ctx.state().clone();
        ctx.state().assign(
            "submit",
            native(move |_| {
                let n = to_number(&submit_state.get("submitted"));
                submit_state.assign("submitted", Value::Number(n + 1.0));
                Ok(Value::Undefined)
            }),
        );
        let node = ctx.render().unwrap();
        let button = node.find("button").unwrap();

        let stopped = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = std::rc::Rc::clone(&stopped);
        let click = ReactiveObject::new();
        click.insert_plain("type", Value::from("click"));
        click.insert_plain(
            "stopPropagation",
            native(move |_| {
                flag.set(true);
                Ok(Value::Undefined)
            }),
        );
        button.emit("click", &[Value::Object(click)]).unwrap();
        assert!(stopped.get());
        assert_eq!(ctx.state().get("count"), Value::from(1));

        let key = |name: &str, code: i32| {
            let event = ReactiveObject::new();
            event.insert_plain("type", Value::from("keyup"));
            event.insert_plain("key", Value::from(name));
            event.insert_plain("keyCode", Value::from(code));
            Value::Object(event)
        };
        button.emit("keyup", &[key("a", 65)]).unwrap();
        assert_eq!(ctx.state().get("submitted"), Value::from(0));
        button.emit("keyup", &[key("Enter", 13)]).unwrap();
        assert_eq!(ctx.state().get("submitted"), Value::from(1));
    }

    #[test]
    fn test_multiple_roots_render_empty() {
        let ctx = RenderContext::new(
            Code::Array(vec![
                Code::call(Helper::CreateElement, vec![Code::TagName("a".into())]),
                Code::call(Helper::CreateElement, vec![Code::TagName("b".into())]),
            ]),
            Vec::new(),
            ReactiveObject::new(),
            FxHashMap::default(),
            FxHashMap::default(),
        );
        assert!(ctx.render().unwrap().is_empty());
    }
}
