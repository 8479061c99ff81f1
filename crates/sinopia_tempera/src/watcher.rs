//! Watchers: effects that re-run when the deps they read change.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashSet;
use sinopia_carton::{format_compact, String};

use crate::dep::{push_target, Dep};
use crate::error::{handle_error, invoke_with_error_handling, ErrorScope, ReactiveError};
use crate::scheduler::queue_watcher;
use crate::value::Value;

static WATCHER_UID: AtomicU64 = AtomicU64::new(0);

pub type Getter = Box<dyn Fn() -> Result<Value, ReactiveError>>;
pub type Callback = Box<dyn Fn(&Value, &Value) -> Result<(), ReactiveError>>;
pub type Hook = Box<dyn Fn()>;

/// How a [`Watcher`] behaves.
#[derive(Default)]
pub struct WatcherOptions {
    /// Read every nested property of the value so deep mutations notify.
    pub deep: bool,
    /// Created by user code (`watch`), as opposed to a render effect.
    pub user: bool,
    /// Evaluate on demand only (computed values).
    pub lazy: bool,
    /// Run immediately on notify instead of queueing.
    pub sync: bool,
    /// Runs in the flush right before the watcher.
    pub before: Option<Hook>,
    /// Runs after the flush that re-ran the watcher.
    pub after: Option<Hook>,
    /// Where errors raised by the getter or callback are routed.
    pub scope: Option<Rc<ErrorScope>>,
}

/// An effect: evaluates a getter while recording every [`Dep`] it reads,
/// and is notified when any of them changes.
pub struct Watcher {
    id: u64,
    expression: String,
    getter: Getter,
    callback: Option<Callback>,
    value: RefCell<Value>,
    deps: RefCell<Vec<Dep>>,
    dep_ids: RefCell<FxHashSet<u64>>,
    new_deps: RefCell<Vec<Dep>>,
    new_dep_ids: RefCell<FxHashSet<u64>>,
    deep: bool,
    user: bool,
    lazy: bool,
    sync: bool,
    dirty: Cell<bool>,
    active: Cell<bool>,
    before: Option<Hook>,
    after: Option<Hook>,
    scope: Option<Rc<ErrorScope>>,
    self_ref: Weak<Watcher>,
}

impl Watcher {
    /// Create a watcher. Unless it is lazy, the getter runs right away to
    /// collect the initial deps and value.
    pub fn new(
        expression: impl Into<String>,
        getter: impl Fn() -> Result<Value, ReactiveError> + 'static,
        callback: Option<Callback>,
        options: WatcherOptions,
    ) -> Rc<Self> {
        let watcher = Rc::new_cyclic(|self_ref| Watcher {
            id: WATCHER_UID.fetch_add(1, Ordering::Relaxed) + 1,
            expression: expression.into(),
            getter: Box::new(getter),
            callback,
            value: RefCell::new(Value::Undefined),
            deps: RefCell::new(Vec::new()),
            dep_ids: RefCell::new(FxHashSet::default()),
            new_deps: RefCell::new(Vec::new()),
            new_dep_ids: RefCell::new(FxHashSet::default()),
            deep: options.deep,
            user: options.user,
            lazy: options.lazy,
            sync: options.sync,
            dirty: Cell::new(options.lazy),
            active: Cell::new(true),
            before: options.before,
            after: options.after,
            scope: options.scope,
            self_ref: Weak::clone(self_ref),
        });
        if !watcher.lazy {
            let value = watcher.get();
            *watcher.value.borrow_mut() = value;
        }
        watcher
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_user(&self) -> bool {
        self.user
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Lazy watchers only: the cached value is stale.
    pub fn dirty(&self) -> bool {
        self.dirty.get()
    }

    /// The value from the last run.
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn dep_count(&self) -> usize {
        self.deps.borrow().len()
    }

    pub fn scope(&self) -> Option<&Rc<ErrorScope>> {
        self.scope.as_ref()
    }

    /// Evaluate the getter and re-collect deps.
    pub fn get(&self) -> Value {
        let value = {
            let _guard = push_target(self.self_ref.upgrade());
            let value = match (self.getter)() {
                Ok(value) => value,
                Err(error) => {
                    let info = format_compact!("getter for watcher \"{}\"", self.expression);
                    handle_error(error, self.scope.as_deref(), &info);
                    Value::Undefined
                }
            };
            if self.deep {
                traverse(&value);
            }
            value
        };
        self.cleanup_deps();
        value
    }

    /// Record `dep` for the current run. Repeated reads are a no-op.
    pub(crate) fn add_dep(&self, dep: &Dep) {
        let id = dep.id();
        if !self.new_dep_ids.borrow_mut().insert(id) {
            return;
        }
        self.new_deps.borrow_mut().push(dep.clone());
        if !self.dep_ids.borrow().contains(&id) {
            dep.add_sub(&self.self_ref);
        }
    }

    /// Drop subscriptions the last run no longer touched, then promote the
    /// new dep set.
    fn cleanup_deps(&self) {
        {
            let new_dep_ids = self.new_dep_ids.borrow();
            for dep in self.deps.borrow().iter() {
                if !new_dep_ids.contains(&dep.id()) {
                    dep.remove_sub(self);
                }
            }
        }
        std::mem::swap(
            &mut *self.dep_ids.borrow_mut(),
            &mut *self.new_dep_ids.borrow_mut(),
        );
        self.new_dep_ids.borrow_mut().clear();
        std::mem::swap(&mut *self.deps.borrow_mut(), &mut *self.new_deps.borrow_mut());
        self.new_deps.borrow_mut().clear();
    }

    /// Called by a dep when it changes.
    pub fn update(&self) {
        if self.lazy {
            self.dirty.set(true);
        } else if self.sync {
            self.run();
        } else if let Some(watcher) = self.self_ref.upgrade() {
            queue_watcher(watcher);
        }
    }

    /// Re-evaluate and, when the value changed (or is a container, or the
    /// watcher is deep), invoke the callback with the new and old values.
    pub fn run(&self) {
        if !self.active.get() {
            return;
        }
        let value = self.get();
        let changed =
            !value.same_value(&self.value.borrow()) || value.is_container() || self.deep;
        if !changed {
            return;
        }
        let old = self.value.replace(value.clone());
        if let Some(callback) = &self.callback {
            let info = format_compact!("callback for watcher \"{}\"", self.expression);
            invoke_with_error_handling(|| callback(&value, &old), self.scope.as_deref(), &info);
        }
    }

    /// Lazy watchers only: compute the value and clear `dirty`.
    pub fn evaluate(&self) {
        let value = self.get();
        *self.value.borrow_mut() = value;
        self.dirty.set(false);
    }

    /// Make the evaluating watcher depend on everything this one read.
    pub fn depend(&self) {
        let deps = self.deps.borrow().clone();
        for dep in deps {
            dep.depend();
        }
    }

    /// Unsubscribe from every dep; the watcher never runs again.
    pub fn teardown(&self) {
        if !self.active.get() {
            return;
        }
        for dep in self.deps.borrow().iter() {
            dep.remove_sub(self);
        }
        self.active.set(false);
    }

    pub(crate) fn call_before(&self) {
        if let Some(before) = &self.before {
            before();
        }
    }

    pub(crate) fn call_after(&self) {
        if let Some(after) = &self.after {
            after();
        }
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("expression", &self.expression)
            .field("deps", &self.deps.borrow().len())
            .field("lazy", &self.lazy)
            .field("dirty", &self.dirty.get())
            .field("active", &self.active.get())
            .finish()
    }
}

/// Read every nested property of `value` so the evaluating watcher depends
/// on all of them.
pub fn traverse(value: &Value) {
    let mut seen = FxHashSet::default();
    traverse_inner(value, &mut seen);
}

fn traverse_inner(value: &Value, seen: &mut FxHashSet<usize>) {
    match value {
        Value::Array(arr) => {
            if arr.is_frozen() || !seen.insert(arr.addr()) {
                return;
            }
            for item in arr.to_vec() {
                traverse_inner(&item, seen);
            }
        }
        Value::Object(obj) => {
            if obj.is_frozen() || !seen.insert(obj.addr()) {
                return;
            }
            for key in obj.keys() {
                traverse_inner(&obj.get(&key), seen);
            }
        }
        _ => {}
    }
}
