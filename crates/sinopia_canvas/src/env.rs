//! Lexical scopes for evaluating template code.
//!
//! Render code runs as if inside `with(this)`: names resolve through the
//! local frames (`v-for` aliases, slot scopes, function parameters) first,
//! then the render scope's state object, then the helpers installed on the
//! root frame, then the allowed globals.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sinopia_carton::{FxHashMap, String};
use sinopia_tempera::{warn, Value};

use crate::builtins::global;

struct Frame {
    vars: RefCell<FxHashMap<String, Value>>,
    parent: Option<Env>,
    this: Value,
}

/// A scope chain. Cloning shares the frames.
#[derive(Clone)]
pub struct Env(Rc<Frame>);

impl Env {
    /// The root frame of a render scope bound to `this`.
    pub fn root(this: Value) -> Self {
        Self(Rc::new(Frame {
            vars: RefCell::new(FxHashMap::default()),
            parent: None,
            this,
        }))
    }

    /// A nested frame sharing `this`.
    pub fn child(&self) -> Self {
        Self(Rc::new(Frame {
            vars: RefCell::new(FxHashMap::default()),
            parent: Some(self.clone()),
            this: self.0.this.clone(),
        }))
    }

    pub fn this(&self) -> &Value {
        &self.0.this
    }

    fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    /// Declare `name` in this frame.
    pub fn define(&self, name: &str, value: Value) {
        self.0.vars.borrow_mut().insert(String::from(name), value);
    }

    fn frames(&self) -> impl Iterator<Item = &Env> {
        std::iter::successors(Some(self), |env| env.0.parent.as_ref())
    }

    /// Resolve `name`, or `None` when nothing declares it.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        for frame in self.frames() {
            if frame.is_root() {
                if let Value::Object(this) = &frame.0.this {
                    if this.contains_key(name) {
                        return Some(this.get(name));
                    }
                }
            }
            if let Some(value) = frame.0.vars.borrow().get(name) {
                return Some(value.clone());
            }
        }
        global(name)
    }

    /// Resolve `name` for a read. Unknown names warn and read as
    /// `undefined`.
    pub fn resolve(&self, name: &str) -> Value {
        match self.lookup(name) {
            Some(value) => value,
            None => {
                warn(&format!(
                    "Property or method \"{}\" is not defined on the instance but referenced during render. Make sure that this property is reactive, either in the data option, or by initializing the property.",
                    name
                ));
                Value::Undefined
            }
        }
    }

    /// Assign to an existing local, or else to the state object.
    pub fn assign(&self, name: &str, value: Value) {
        for frame in self.frames() {
            if frame.is_root() {
                break;
            }
            if let Some(slot) = frame.0.vars.borrow_mut().get_mut(name) {
                *slot = value;
                return;
            }
        }
        let root = self.frames().last().unwrap_or(self);
        match &root.0.this {
            Value::Object(this) if !root.0.vars.borrow().contains_key(name) => {
                this.assign(name, value)
            }
            _ => root.define(name, value),
        }
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<Vec<String>> = self
            .frames()
            .map(|frame| frame.0.vars.borrow().keys().cloned().collect())
            .collect();
        f.debug_struct("Env").field("frames", &names).finish()
    }
}
