//! Reactive values.
//!
//! State is a dynamic [`Value`] graph. Containers are shared handles
//! ([`ReactiveObject`], [`ReactiveArray`]): cloning a container value clones
//! the handle, not the contents. A container becomes reactive once
//! [`observe`](crate::observe) gives it an observer (its "self" [`Dep`]);
//! until then reads and writes are plain.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use sinopia_carton::String;

use crate::dep::{current_target, Dep};
use crate::error::ReactiveError;
use crate::observer::observe;

/// A native function callable from templates.
#[derive(Clone)]
pub struct Callable(Rc<dyn Fn(&[Value]) -> Result<Value, ReactiveError>>);

impl Callable {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, ReactiveError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, ReactiveError> {
        (self.0)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(ReactiveArray),
    Object(ReactiveObject),
    Function(Callable),
}

impl Value {
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Object or array.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ReactiveArray> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Identity for containers and functions, value equality for
    /// primitives. `NaN` equals itself so re-assigning it is a no-op.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }

    /// The container's self dep, once observed.
    pub fn observer_dep(&self) -> Option<Dep> {
        match self {
            Value::Array(arr) => arr.observer_dep(),
            Value::Object(obj) => obj.observer_dep(),
            _ => None,
        }
    }

    /// Build an unobserved graph from JSON.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.as_str().into()),
            serde_json::Value::Array(items) => {
                Value::Array(ReactiveArray::from_vec(items.iter().map(Value::from_json).collect()))
            }
            serde_json::Value::Object(map) => Value::Object(ReactiveObject::from_pairs(
                map.iter().map(|(k, v)| (String::from(k.as_str()), Value::from_json(v))),
            )),
        }
    }

    /// Snapshot as JSON without recording dependencies. Functions and
    /// `undefined` properties are skipped; non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            // integral values print without a fraction
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.snapshot().iter().map(Value::to_json).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.snapshot()
                    .into_iter()
                    .filter(|(_, v)| !matches!(v, Value::Undefined | Value::Function(_)))
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Converts like `String(value)`: arrays join their items with `,` and
/// objects print as `[object Object]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(arr) => {
                for (i, item) in arr.snapshot().iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::Function(_) => f.write_str("function () { [native code] }"),
        }
    }
}

/// Number to string the way script engines print them.
pub fn format_number(n: f64) -> std::string::String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ReactiveObject> for Value {
    fn from(obj: ReactiveObject) -> Self {
        Value::Object(obj)
    }
}

impl From<ReactiveArray> for Value {
    fn from(arr: ReactiveArray) -> Self {
        Value::Array(arr)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(ReactiveArray::from_vec(items))
    }
}

/// Track the self deps of an array's observed elements, recursively, so a
/// reader of the array also sees mutations of nested arrays and objects.
pub(crate) fn depend_array(items: &[Value]) {
    for item in items {
        if let Some(dep) = item.observer_dep() {
            dep.depend();
        }
        if let Value::Array(arr) = item {
            depend_array(&arr.snapshot());
        }
    }
}

// ============================================================================
// Objects
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct Property {
    pub(crate) value: Value,
    /// `None` for plain properties.
    pub(crate) dep: Option<Dep>,
    /// Reactive, but the value is not observed.
    pub(crate) shallow: bool,
}

#[derive(Debug, Default)]
struct ObjectInner {
    props: RefCell<IndexMap<String, Property>>,
    observer: RefCell<Option<Dep>>,
    frozen: Cell<bool>,
    root: Cell<bool>,
}

/// A string-keyed object with insertion-ordered properties.
#[derive(Clone, Default)]
pub struct ReactiveObject(Rc<ObjectInner>);

impl ReactiveObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// A plain object; [`observe`](crate::observe) makes its properties reactive.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        let obj = Self::new();
        {
            let mut props = obj.0.props.borrow_mut();
            for (key, value) in pairs {
                props.insert(
                    key,
                    Property {
                        value,
                        dep: None,
                        shallow: false,
                    },
                );
            }
        }
        obj
    }

    pub fn ptr_eq(&self, other: &ReactiveObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn observer_dep(&self) -> Option<Dep> {
        self.0.observer.borrow().clone()
    }

    pub fn is_observed(&self) -> bool {
        self.0.observer.borrow().is_some()
    }

    pub(crate) fn install_observer(&self) -> Dep {
        let dep = Dep::new();
        *self.0.observer.borrow_mut() = Some(dep.clone());
        dep
    }

    /// Mark the object non-extensible: no properties can be added,
    /// removed or made reactive, and [`observe`](crate::observe) skips it.
    pub fn freeze(&self) {
        self.0.frozen.set(true);
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    /// Root state of a render scope: new keys cannot be added reactively.
    pub fn is_root(&self) -> bool {
        self.0.root.get()
    }

    pub(crate) fn mark_root(&self) {
        self.0.root.set(true);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.props.borrow().contains_key(key)
    }

    /// Whether `key` is backed by its own dep.
    pub fn is_reactive_property(&self, key: &str) -> bool {
        self.0.props.borrow().get(key).is_some_and(|p| p.dep.is_some())
    }

    pub fn len(&self) -> usize {
        self.0.props.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a property, recording its dep (and the value's self dep) on the
    /// evaluating watcher.
    pub fn get(&self, key: &str) -> Value {
        let (value, dep, shallow) = match self.0.props.borrow().get(key) {
            Some(prop) => (prop.value.clone(), prop.dep.clone(), prop.shallow),
            None => return Value::Undefined,
        };
        if let Some(dep) = dep {
            if current_target().is_some() {
                dep.depend();
                if !shallow {
                    if let Some(child) = value.observer_dep() {
                        child.depend();
                    }
                    if let Value::Array(arr) = &value {
                        depend_array(&arr.snapshot());
                    }
                }
            }
        }
        value
    }

    /// Keys in insertion order; records the self dep so additions and
    /// deletions through [`set`](crate::set)/[`del`](crate::del) are seen.
    pub fn keys(&self) -> Vec<String> {
        if let Some(dep) = self.observer_dep() {
            dep.depend();
        }
        self.0.props.borrow().keys().cloned().collect()
    }

    /// Assign like a property write: reactive properties notify when the
    /// value changes; a new key is added as a plain, non-reactive property.
    pub fn assign(&self, key: &str, value: Value) {
        let existing = self
            .0
            .props
            .borrow()
            .get(key)
            .map(|prop| (prop.value.clone(), prop.dep.clone(), prop.shallow));
        match existing {
            Some((old, Some(dep), shallow)) => {
                if old.same_value(&value) {
                    return;
                }
                if !shallow {
                    observe(&value);
                }
                if let Some(prop) = self.0.props.borrow_mut().get_mut(key) {
                    prop.value = value;
                }
                dep.notify();
            }
            Some((_, None, _)) => {
                if let Some(prop) = self.0.props.borrow_mut().get_mut(key) {
                    prop.value = value;
                }
            }
            None => self.insert_plain(key, value),
        }
    }

    /// Add or overwrite a property without making it reactive and without
    /// notifying anyone.
    pub fn insert_plain(&self, key: &str, value: Value) {
        if self.is_frozen() && !self.contains_key(key) {
            return;
        }
        let mut props = self.0.props.borrow_mut();
        match props.get_mut(key) {
            Some(prop) => prop.value = value,
            None => {
                props.insert(
                    key.into(),
                    Property {
                        value,
                        dep: None,
                        shallow: false,
                    },
                );
            }
        }
    }

    pub(crate) fn define(&self, key: &str, prop: Property) {
        self.0.props.borrow_mut().insert(key.into(), prop);
    }

    /// Remove a property without notifying anyone; [`del`](crate::del)
    /// is the reactive way.
    pub fn remove(&self, key: &str) -> Option<Value> {
        if self.is_frozen() {
            return None;
        }
        self.0.props.borrow_mut().shift_remove(key).map(|p| p.value)
    }

    /// Key/value pairs without recording dependencies.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.0
            .props
            .borrow()
            .iter()
            .map(|(k, p)| (k.clone(), p.value.clone()))
            .collect()
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let props = self.0.props.borrow();
        f.debug_map()
            .entries(props.iter().map(|(k, p)| (k, &p.value)))
            .finish()
    }
}

// ============================================================================
// Arrays
// ============================================================================

#[derive(Debug, Default)]
struct ArrayInner {
    items: RefCell<Vec<Value>>,
    observer: RefCell<Option<Dep>>,
    frozen: Cell<bool>,
}

/// A list whose mutators are the only way to change it; on an observed
/// array each mutator observes inserted items and notifies the self dep.
#[derive(Clone, Default)]
pub struct ReactiveArray(Rc<ArrayInner>);

impl ReactiveArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(items: Vec<Value>) -> Self {
        let arr = Self::new();
        *arr.0.items.borrow_mut() = items;
        arr
    }

    pub fn ptr_eq(&self, other: &ReactiveArray) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn observer_dep(&self) -> Option<Dep> {
        self.0.observer.borrow().clone()
    }

    pub fn is_observed(&self) -> bool {
        self.0.observer.borrow().is_some()
    }

    pub(crate) fn install_observer(&self) -> Dep {
        let dep = Dep::new();
        *self.0.observer.borrow_mut() = Some(dep.clone());
        dep
    }

    pub fn freeze(&self) {
        self.0.frozen.set(true);
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    fn depend_self(&self) {
        if let Some(dep) = self.observer_dep() {
            dep.depend();
        }
    }

    pub fn len(&self) -> usize {
        self.depend_self();
        self.0.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Value {
        self.depend_self();
        self.0.items.borrow().get(index).cloned().unwrap_or_default()
    }

    /// A copy of the items, recording the self dep.
    pub fn to_vec(&self) -> Vec<Value> {
        self.depend_self();
        self.snapshot()
    }

    /// A copy of the items without recording dependencies.
    pub fn snapshot(&self) -> Vec<Value> {
        self.0.items.borrow().clone()
    }

    /// Items inserted by a mutator are observed when the array is.
    fn inserted(&self, items: &[Value]) {
        if self.is_observed() {
            for item in items {
                observe(item);
            }
        }
    }

    fn changed(&self) {
        if let Some(dep) = self.observer_dep() {
            dep.notify();
        }
    }

    pub fn push(&self, value: Value) -> usize {
        self.inserted(std::slice::from_ref(&value));
        let len = {
            let mut items = self.0.items.borrow_mut();
            items.push(value);
            items.len()
        };
        self.changed();
        len
    }

    pub fn pop(&self) -> Value {
        let value = self.0.items.borrow_mut().pop().unwrap_or_default();
        self.changed();
        value
    }

    pub fn shift(&self) -> Value {
        let value = {
            let mut items = self.0.items.borrow_mut();
            if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            }
        };
        self.changed();
        value
    }

    pub fn unshift(&self, values: Vec<Value>) -> usize {
        self.inserted(&values);
        let len = {
            let mut items = self.0.items.borrow_mut();
            items.splice(0..0, values);
            items.len()
        };
        self.changed();
        len
    }

    /// Remove `delete_count` items at `start` and insert `values` there.
    /// `start` past the end appends; the count is clamped.
    pub fn splice(&self, start: usize, delete_count: usize, values: Vec<Value>) -> Vec<Value> {
        self.inserted(&values);
        let removed = {
            let mut items = self.0.items.borrow_mut();
            let start = start.min(items.len());
            let end = start + delete_count.min(items.len() - start);
            items.splice(start..end, values).collect()
        };
        self.changed();
        removed
    }

    /// Stable sort. The comparator runs with no borrow held, so it may read
    /// this array; it sees the contents from before the sort.
    pub fn sort_by(&self, mut compare: impl FnMut(&Value, &Value) -> Ordering) {
        let items = self.0.items.borrow().clone();
        let sorted = merge_sort_by(items, &mut compare);
        *self.0.items.borrow_mut() = sorted;
        self.changed();
    }

    pub fn reverse(&self) {
        self.0.items.borrow_mut().reverse();
        self.changed();
    }

    /// Write an index directly. Like assigning `list[i]`, this does not
    /// notify; [`set`](crate::set) is the reactive way.
    pub fn set_plain(&self, index: usize, value: Value) {
        let mut items = self.0.items.borrow_mut();
        if index >= items.len() {
            items.resize(index + 1, Value::Undefined);
        }
        items[index] = value;
    }

    /// Pad with `undefined` up to `len` without notifying, like growing
    /// `length` directly.
    pub(crate) fn grow_to(&self, len: usize) {
        let mut items = self.0.items.borrow_mut();
        if items.len() < len {
            items.resize(len, Value::Undefined);
        }
    }
}

impl fmt::Debug for ReactiveArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.items.borrow().iter()).finish()
    }
}

/// Merge sort that accepts comparators which are not a total order
/// (`slice::sort_by` may panic on those, and template comparators can be).
fn merge_sort_by(
    mut items: Vec<Value>,
    compare: &mut impl FnMut(&Value, &Value) -> Ordering,
) -> Vec<Value> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, compare);
    let mut right = merge_sort_by(right, compare).into_iter().peekable();
    let mut out = Vec::with_capacity(left.len() + right.len());
    for item in left {
        while let Some(next) = right.next_if(|r| compare(r, &item) == Ordering::Less) {
            out.push(next);
        }
        out.push(item);
    }
    out.extend(right);
    out
}
