//! The watcher queue.
//!
//! Watchers notified outside a flush are batched: each is queued once and
//! the queue is flushed on the next [`tick`](crate::tick), in ascending id
//! order, so parents (created first) update before their children and user
//! watchers run before the render effect that reads what they change.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config;
use crate::next_tick::next_tick;
use crate::watcher::Watcher;

/// Runs of one watcher within a flush before it is treated as runaway.
pub const MAX_UPDATE_COUNT: u32 = 100;

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerState {
    queue: Vec<Rc<Watcher>>,
    has: FxHashSet<u64>,
    circular: FxHashMap<u64, u32>,
    skipped: FxHashSet<u64>,
    activated: Vec<Callback>,
    after_flush: Vec<Callback>,
    waiting: bool,
    flushing: bool,
    index: usize,
}

thread_local! {
    static SCHEDULER: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

fn with_state<R>(f: impl FnOnce(&mut SchedulerState) -> R) -> R {
    SCHEDULER.with(|state| f(&mut state.borrow_mut()))
}

/// Queue `watcher` for the next flush. Already-queued watchers are ignored;
/// during a flush the watcher is inserted by id after the current position.
pub fn queue_watcher(watcher: Rc<Watcher>) {
    let id = watcher.id();
    let schedule = with_state(|state| {
        if state.has.contains(&id) || state.skipped.contains(&id) {
            return false;
        }
        state.has.insert(id);
        if !state.flushing {
            state.queue.push(watcher);
        } else {
            let mut at = state.queue.len();
            while at > state.index + 1 && state.queue[at - 1].id() > id {
                at -= 1;
            }
            state.queue.insert(at, watcher);
        }
        !std::mem::replace(&mut state.waiting, true)
    });
    if schedule {
        schedule_flush();
    }
}

/// Run `callback` once the current (or next) flush has finished.
pub fn run_after_current_flush(callback: impl FnOnce() + 'static) {
    let schedule = with_state(|state| {
        state.after_flush.push(Box::new(callback));
        !std::mem::replace(&mut state.waiting, true)
    });
    if schedule {
        schedule_flush();
    }
}

/// Run `callback` at the end of the current flush, before the `after`
/// hooks, for components re-activated during the flush.
pub fn queue_activated_component(callback: impl FnOnce() + 'static) {
    let schedule = with_state(|state| {
        state.activated.push(Box::new(callback));
        !std::mem::replace(&mut state.waiting, true)
    });
    if schedule {
        schedule_flush();
    }
}

/// A flush is running.
pub fn is_flushing() -> bool {
    with_state(|state| state.flushing)
}

/// Watchers queued and not yet run.
pub fn pending_watchers() -> usize {
    with_state(|state| state.queue.len().saturating_sub(state.index))
}

fn schedule_flush() {
    if config::async_flush() {
        next_tick(flush_scheduler_queue);
    } else {
        flush_scheduler_queue();
    }
}

fn flush_scheduler_queue() {
    with_state(|state| {
        state.flushing = true;
        state.queue.sort_by_key(|watcher| watcher.id());
        state.index = 0;
    });
    tracing::debug!(watchers = pending_watchers(), "flushing scheduler queue");

    // the queue can grow while flushing, so its length is re-read each turn
    loop {
        let Some(watcher) = with_state(|state| state.queue.get(state.index).cloned()) else {
            break;
        };
        let id = watcher.id();
        if !with_state(|state| state.skipped.contains(&id)) {
            watcher.call_before();
            with_state(|state| state.has.remove(&id));
            watcher.run();
            let runaway = with_state(|state| {
                if !state.has.contains(&id) {
                    return false;
                }
                let count = state.circular.entry(id).or_insert(0);
                *count += 1;
                if *count > MAX_UPDATE_COUNT {
                    state.skipped.insert(id);
                    true
                } else {
                    false
                }
            });
            if runaway {
                let msg = if watcher.is_user() {
                    format!(
                        "You may have an infinite update loop in watcher with expression \"{}\"",
                        watcher.expression()
                    )
                } else {
                    "You may have an infinite update loop in a component render function."
                        .to_string()
                };
                config::warn(&msg);
            }
        }
        with_state(|state| state.index += 1);
    }

    // reset before the hooks so they can queue a fresh flush
    let (queue, activated, after_flush) = with_state(|state| {
        let snapshot = (
            std::mem::take(&mut state.queue),
            std::mem::take(&mut state.activated),
            std::mem::take(&mut state.after_flush),
        );
        state.has.clear();
        state.circular.clear();
        state.skipped.clear();
        state.index = 0;
        state.waiting = false;
        state.flushing = false;
        snapshot
    });

    for callback in activated {
        callback();
    }
    for watcher in queue.iter().rev() {
        if watcher.is_active() {
            watcher.call_after();
        }
    }
    for callback in after_flush {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::next_tick::tick;
    use crate::value::{ReactiveObject, Value};
    use crate::watcher::WatcherOptions;
    use crate::{observe, Watcher};
    use std::cell::Cell;

    fn counter_state() -> ReactiveObject {
        let obj = ReactiveObject::from_pairs([("n".into(), Value::from(0))]);
        observe(&Value::Object(obj.clone()));
        obj
    }

    #[test]
    fn test_batches_until_tick() {
        let obj = counter_state();
        let reader = obj.clone();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let watcher = Watcher::new(
            "n",
            move || {
                counter.set(counter.get() + 1);
                Ok(reader.get("n"))
            },
            None,
            WatcherOptions::default(),
        );
        obj.assign("n", 1.into());
        obj.assign("n", 2.into());
        obj.assign("n", 3.into());
        assert_eq!(runs.get(), 1);
        assert_eq!(pending_watchers(), 1);
        tick();
        assert_eq!(runs.get(), 2);
        assert_eq!(watcher.value(), Value::from(3));
    }

    #[test]
    fn test_after_flush_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        run_after_current_flush(move || sink.borrow_mut().push("after"));
        let sink = Rc::clone(&log);
        run_after_current_flush(move || sink.borrow_mut().push("again"));
        assert!(log.borrow().is_empty());
        tick();
        assert_eq!(*log.borrow(), ["after", "again"]);
        assert!(!is_flushing());
    }

    #[test]
    fn test_after_hooks_run_in_reverse() {
        let obj = counter_state();
        let log = Rc::new(RefCell::new(Vec::new()));
        let watchers: Vec<_> = ["parent", "child"]
            .into_iter()
            .map(|name| {
                let reader = obj.clone();
                let sink = Rc::clone(&log);
                Watcher::new(
                    name,
                    move || Ok(reader.get("n")),
                    None,
                    WatcherOptions {
                        after: Some(Box::new(move || sink.borrow_mut().push(name))),
                        ..Default::default()
                    },
                )
            })
            .collect();
        obj.assign("n", 1.into());
        tick();
        assert_eq!(*log.borrow(), ["child", "parent"]);
        drop(watchers);
    }

    #[test]
    fn test_activated_callback_schedules_a_flush() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        queue_activated_component(move || flag.set(true));
        assert!(!ran.get());
        tick();
        assert!(ran.get());
    }

    #[test]
    fn test_activated_run_between_watchers_and_after_hooks() {
        let obj = counter_state();
        let log = Rc::new(RefCell::new(Vec::new()));
        let reader = obj.clone();
        let sink = Rc::clone(&log);
        let after = Rc::clone(&log);
        let watcher = Watcher::new(
            "n",
            move || {
                sink.borrow_mut().push("watcher");
                Ok(reader.get("n"))
            },
            None,
            WatcherOptions {
                after: Some(Box::new(move || after.borrow_mut().push("after"))),
                ..Default::default()
            },
        );
        log.borrow_mut().clear();

        let sink = Rc::clone(&log);
        queue_activated_component(move || sink.borrow_mut().push("activated"));
        obj.assign("n", 1.into());
        tick();
        assert_eq!(*log.borrow(), ["watcher", "activated", "after"]);
        drop(watcher);
    }
}
