//! Dependency publish points and the evaluating-watcher stack.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config;
use crate::watcher::Watcher;

static DEP_UID: AtomicU64 = AtomicU64::new(0);

struct DepInner {
    id: u64,
    subs: RefCell<Vec<Weak<Watcher>>>,
}

/// A publish point for one reactive property or container.
///
/// Subscribers are held weakly: a watcher nobody owns anymore simply stops
/// being notified. Cloning a `Dep` yields another handle to the same node.
#[derive(Clone)]
pub struct Dep(Rc<DepInner>);

impl Dep {
    pub fn new() -> Self {
        Self(Rc::new(DepInner {
            id: DEP_UID.fetch_add(1, Ordering::Relaxed),
            subs: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.0.subs.borrow().iter().filter(|w| w.strong_count() > 0).count()
    }

    pub(crate) fn add_sub(&self, watcher: &Weak<Watcher>) {
        let mut subs = self.0.subs.borrow_mut();
        subs.retain(|w| w.strong_count() > 0);
        if !subs.iter().any(|w| w.ptr_eq(watcher)) {
            subs.push(Weak::clone(watcher));
        }
    }

    pub(crate) fn remove_sub(&self, watcher: &Watcher) {
        let target: *const Watcher = watcher;
        self.0
            .subs
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), target));
    }

    /// Record this dep on the evaluating watcher, if any.
    pub fn depend(&self) {
        if let Some(target) = current_target() {
            target.add_dep(self);
        }
    }

    /// Update every subscriber.
    ///
    /// Works on a snapshot: an update may change this dep's subscribers.
    pub fn notify(&self) {
        let mut subs: Vec<Rc<Watcher>> =
            self.0.subs.borrow().iter().filter_map(Weak::upgrade).collect();
        if !config::async_flush() {
            // no scheduler sorting when flushing synchronously
            subs.sort_by_key(|w| w.id());
        }
        for sub in subs {
            sub.update();
        }
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Dep {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.0.id)
            .field("subs", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Target stack
// ============================================================================

thread_local! {
    static TARGET_STACK: RefCell<Vec<Option<Rc<Watcher>>>> = const { RefCell::new(Vec::new()) };
}

/// The watcher currently evaluating, if tracking is on.
pub fn current_target() -> Option<Rc<Watcher>> {
    TARGET_STACK.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Pops the target pushed by [`push_target`] when dropped.
#[must_use = "the target is popped as soon as the guard is dropped"]
pub struct TargetGuard {
    depth: usize,
}

impl Drop for TargetGuard {
    fn drop(&mut self) {
        TARGET_STACK.with(|stack| stack.borrow_mut().truncate(self.depth));
    }
}

/// Make `target` the evaluating watcher until the guard drops. `None`
/// suspends tracking.
pub fn push_target(target: Option<Rc<Watcher>>) -> TargetGuard {
    TARGET_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let depth = stack.len();
        stack.push(target);
        TargetGuard { depth }
    })
}

/// Run `f` without recording dependencies.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _guard = push_target(None);
    f()
}
