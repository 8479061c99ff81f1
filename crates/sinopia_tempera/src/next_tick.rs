//! The tick queue.
//!
//! Callbacks deferred with [`next_tick`] run, in order, when the host calls
//! [`tick`]. This is where the scheduler's flush runs.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{handle_error, ReactiveError};

type Task = Box<dyn FnOnce()>;

thread_local! {
    static CALLBACKS: RefCell<VecDeque<Task>> = const { RefCell::new(VecDeque::new()) };
}

/// Defer `callback` to the next [`tick`].
pub fn next_tick(callback: impl FnOnce() + 'static) {
    CALLBACKS.with(|callbacks| callbacks.borrow_mut().push_back(Box::new(callback)));
}

/// Defer a fallible callback; its error is routed with the `nextTick` info.
pub fn try_next_tick(callback: impl FnOnce() -> Result<(), ReactiveError> + 'static) {
    next_tick(move || {
        if let Err(error) = callback() {
            handle_error(error, None, "nextTick");
        }
    });
}

/// Callbacks waiting for the next tick.
pub fn pending_ticks() -> usize {
    CALLBACKS.with(|callbacks| callbacks.borrow().len())
}

/// Run deferred callbacks until none remain, including callbacks deferred
/// while running. Returns how many ran.
pub fn tick() -> usize {
    let mut count = 0;
    loop {
        let batch = CALLBACKS.with(|callbacks| std::mem::take(&mut *callbacks.borrow_mut()));
        if batch.is_empty() {
            break;
        }
        tracing::trace!(callbacks = batch.len(), "tick");
        for callback in batch {
            callback();
            count += 1;
        }
    }
    count
}
