//! Typed reactive cells, computed values and user watchers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use sinopia_carton::{format_compact, String};

use crate::dep::{current_target, untracked, Dep};
use crate::error::{invoke_with_error_handling, ErrorScope, ReactiveError};
use crate::value::Value;
use crate::watcher::{Watcher, WatcherOptions};

// ============================================================================
// Reactive<T>
// ============================================================================

struct ReactiveInner<T> {
    value: RefCell<T>,
    dep: Dep,
}

/// A typed reactive cell: reads record its dep, changing writes notify it.
pub struct Reactive<T>(Rc<ReactiveInner<T>>);

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Clone + PartialEq + 'static> Reactive<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(ReactiveInner {
            value: RefCell::new(value),
            dep: Dep::new(),
        }))
    }

    pub fn get(&self) -> T {
        self.0.dep.depend();
        self.0.value.borrow().clone()
    }

    /// Read by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.dep.depend();
        f(&self.0.value.borrow())
    }

    pub fn get_untracked(&self) -> T {
        self.0.value.borrow().clone()
    }

    /// Write; readers are notified only when the value changed.
    pub fn set(&self, value: T) {
        if *self.0.value.borrow() == value {
            return;
        }
        *self.0.value.borrow_mut() = value;
        self.0.dep.notify();
    }

    /// Mutate in place and notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.value.borrow_mut());
        self.0.dep.notify();
    }

    pub fn dep(&self) -> &Dep {
        &self.0.dep
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.0.value.borrow()).finish()
    }
}

// ============================================================================
// Computed<T>
// ============================================================================

/// A cached derived value. It is recomputed on the first read after one of
/// its deps changed, and readers inherit its deps.
pub struct Computed<T> {
    watcher: Rc<Watcher>,
    cache: Rc<RefCell<Option<T>>>,
}

impl<T: Clone + 'static> Computed<T> {
    pub fn get(&self) -> T {
        if self.watcher.dirty() {
            self.watcher.evaluate();
        }
        if current_target().is_some() {
            self.watcher.depend();
        }
        loop {
            if let Some(value) = self.cache.borrow().clone() {
                return value;
            }
            self.watcher.evaluate();
        }
    }

    pub fn watcher(&self) -> &Rc<Watcher> {
        &self.watcher
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            watcher: Rc::clone(&self.watcher),
            cache: Rc::clone(&self.cache),
        }
    }
}

/// Create a computed value from `getter`.
pub fn computed<T: Clone + 'static>(getter: impl Fn() -> T + 'static) -> Computed<T> {
    let cache = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&cache);
    let watcher = Watcher::new(
        "computed",
        move || {
            let value = getter();
            *slot.borrow_mut() = Some(value);
            Ok(Value::Undefined)
        },
        None,
        WatcherOptions {
            lazy: true,
            ..Default::default()
        },
    );
    Computed { watcher, cache }
}

// ============================================================================
// watch
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Shown in diagnostics about this watcher.
    pub expression: String,
    pub deep: bool,
    /// Invoke the callback once right away with the current value.
    pub immediate: bool,
    pub sync: bool,
    pub scope: Option<Rc<ErrorScope>>,
}

/// Owns a user watcher; dropping the handle drops the watcher.
#[derive(Debug)]
pub struct WatchHandle {
    watcher: Rc<Watcher>,
}

impl WatchHandle {
    /// Stop watching.
    pub fn stop(&self) {
        self.watcher.teardown();
    }

    /// The current watched value.
    pub fn value(&self) -> Value {
        self.watcher.value()
    }

    pub fn watcher(&self) -> &Rc<Watcher> {
        &self.watcher
    }
}

/// Call `callback(new, old)` whenever the value produced by `getter` changes.
pub fn watch(
    getter: impl Fn() -> Result<Value, ReactiveError> + 'static,
    callback: impl Fn(&Value, &Value) -> Result<(), ReactiveError> + 'static,
    options: WatchOptions,
) -> WatchHandle {
    let callback = Rc::new(callback);
    let on_change = Rc::clone(&callback);
    let watcher = Watcher::new(
        options.expression.clone(),
        getter,
        Some(Box::new(move |new: &Value, old: &Value| on_change(new, old))),
        WatcherOptions {
            deep: options.deep,
            user: true,
            sync: options.sync,
            scope: options.scope.clone(),
            ..Default::default()
        },
    );
    if options.immediate {
        let info = format_compact!("callback for immediate watcher \"{}\"", options.expression);
        let value = watcher.value();
        untracked(|| {
            invoke_with_error_handling(
                || callback(&value, &Value::Undefined),
                options.scope.as_deref(),
                &info,
            )
        });
    }
    WatchHandle { watcher }
}
