//! End-to-end behavior of the reactive engine.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sinopia_tempera::{
    configure, observe, take_uncaught_errors, tick, watch, ErrorScope, Propagation, Reactive,
    ReactiveError, ReactiveObject, Value, WatchHandle, WatchOptions, MAX_UPDATE_COUNT,
};

fn observed(json: serde_json::Value) -> ReactiveObject {
    let value = Value::from_json(&json);
    observe(&value);
    value.as_object().cloned().unwrap_or_default()
}

fn counting_watch(
    getter: impl Fn() -> Value + 'static,
) -> (WatchHandle, Rc<RefCell<Vec<Value>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let handle = watch(
        move || Ok(getter()),
        move |new, _| {
            sink.borrow_mut().push(new.clone());
            Ok(())
        },
        WatchOptions::default(),
    );
    (handle, seen)
}

fn capture_warnings() -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    configure(|config| {
        config.warn_handler = Some(Rc::new(move |msg: &str| sink.borrow_mut().push(msg.to_string())));
    });
    seen
}

// =============================================================================
// Dependency tracking
// =============================================================================

mod tracking {
    use super::*;

    #[test]
    fn reruns_on_read_property() {
        let state = observed(serde_json::json!({"p": 1, "q": 1}));
        let reader = state.clone();
        let (_handle, seen) = counting_watch(move || reader.get("p"));
        state.assign("p", 2.into());
        tick();
        assert_eq!(*seen.borrow(), [Value::from(2)]);
    }

    #[test]
    fn stale_dependency_is_unsubscribed() {
        let state = observed(serde_json::json!({"use_p": true, "p": 1, "q": 10}));
        let reader = state.clone();
        let (_handle, seen) = counting_watch(move || {
            if reader.get("use_p").is_truthy() {
                reader.get("p")
            } else {
                reader.get("q")
            }
        });
        state.assign("use_p", Value::Bool(false));
        tick();
        assert_eq!(*seen.borrow(), [Value::from(10)]);

        // p was not read by the last run
        state.assign("p", 5.into());
        tick();
        assert_eq!(seen.borrow().len(), 1);

        state.assign("q", 11.into());
        tick();
        assert_eq!(*seen.borrow(), [Value::from(10), Value::from(11)]);
    }

    #[test]
    fn nested_object_replacement_is_tracked() {
        let state = observed(serde_json::json!({"user": {"name": "a"}}));
        let reader = state.clone();
        let (_handle, seen) = counting_watch(move || {
            reader.get("user").as_object().map(|u| u.get("name")).unwrap_or_default()
        });
        state.assign("user", Value::from_json(&serde_json::json!({"name": "b"})));
        tick();
        let user = state.get("user");
        if let Some(user) = user.as_object() {
            user.assign("name", "c".into());
        }
        tick();
        assert_eq!(*seen.borrow(), [Value::from("b"), Value::from("c")]);
    }

    #[test]
    fn deep_watch_sees_nested_mutation() {
        let state = observed(serde_json::json!({"form": {"fields": {"a": 1}}}));
        let reader = state.clone();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let _handle = watch(
            move || Ok(reader.get("form")),
            move |_, _| {
                counter.set(counter.get() + 1);
                Ok(())
            },
            WatchOptions {
                deep: true,
                ..Default::default()
            },
        );
        let fields = state
            .get("form")
            .as_object()
            .map(|form| form.get("fields"))
            .unwrap_or_default();
        if let Some(fields) = fields.as_object() {
            fields.assign("a", 2.into());
        }
        tick();
        assert_eq!(calls.get(), 1);
    }
}

// =============================================================================
// Scheduling
// =============================================================================

mod scheduling {
    use super::*;

    #[test]
    fn batching_runs_once_with_final_value() {
        let state = observed(serde_json::json!({"n": 0}));
        let reader = state.clone();
        let evaluations = Rc::new(Cell::new(0));
        let counter = Rc::clone(&evaluations);
        let (_handle, seen) = counting_watch(move || {
            counter.set(counter.get() + 1);
            reader.get("n")
        });
        for n in 1..=10 {
            state.assign("n", n.into());
        }
        assert!(seen.borrow().is_empty());
        tick();
        assert_eq!(evaluations.get(), 2);
        assert_eq!(*seen.borrow(), [Value::from(10)]);
    }

    #[test]
    fn flush_runs_in_creation_order() {
        let cells: Vec<Reactive<i32>> = (0..3).map(|_| Reactive::new(0)).collect();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handles: Vec<WatchHandle> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let reader = cell.clone();
                let sink = Rc::clone(&log);
                watch(
                    move || Ok(Value::from(reader.get())),
                    move |_, _| {
                        sink.borrow_mut().push(i + 1);
                        Ok(())
                    },
                    WatchOptions::default(),
                )
            })
            .collect();
        assert!(handles[0].watcher().id() < handles[1].watcher().id());

        cells[2].set(1);
        cells[0].set(1);
        cells[1].set(1);
        tick();
        assert_eq!(*log.borrow(), [1, 2, 3]);
    }

    #[test]
    fn watcher_torn_down_mid_flush_does_not_run() {
        let a = Reactive::new(0);
        let b = Reactive::new(0);
        let victim: Rc<RefCell<Option<WatchHandle>>> = Rc::new(RefCell::new(None));
        let victim_runs = Rc::new(Cell::new(0));

        let target = Rc::clone(&victim);
        let reader = a.clone();
        let _first = watch(
            move || Ok(Value::from(reader.get())),
            move |_, _| {
                if let Some(handle) = target.borrow().as_ref() {
                    handle.stop();
                }
                Ok(())
            },
            WatchOptions::default(),
        );

        let counter = Rc::clone(&victim_runs);
        let reader = b.clone();
        *victim.borrow_mut() = Some(watch(
            move || Ok(Value::from(reader.get())),
            move |_, _| {
                counter.set(counter.get() + 1);
                Ok(())
            },
            WatchOptions::default(),
        ));

        b.set(1);
        a.set(1);
        tick();
        assert_eq!(victim_runs.get(), 0);
    }

    #[test]
    fn watcher_queued_mid_flush_runs_in_same_flush() {
        let source = Reactive::new(0);
        let derived = Reactive::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let reader = source.clone();
        let writer = derived.clone();
        let sink = Rc::clone(&log);
        let _producer = watch(
            move || Ok(Value::from(reader.get())),
            move |new, _| {
                sink.borrow_mut().push("producer");
                writer.set(new.as_number().unwrap_or_default() as i32 * 2);
                Ok(())
            },
            WatchOptions::default(),
        );
        let reader = derived.clone();
        let sink = Rc::clone(&log);
        let _consumer = watch(
            move || Ok(Value::from(reader.get())),
            move |_, _| {
                sink.borrow_mut().push("consumer");
                Ok(())
            },
            WatchOptions::default(),
        );

        source.set(2);
        assert_eq!(tick(), 1);
        assert_eq!(*log.borrow(), ["producer", "consumer"]);
        assert_eq!(derived.get_untracked(), 4);
    }

    #[test]
    fn loop_guard_stops_runaway_watcher() {
        let warnings = capture_warnings();
        let x = Reactive::new(0);
        let reader = x.clone();
        let writer = x.clone();
        let runs = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&runs);
        let _handle = watch(
            move || Ok(Value::from(reader.get())),
            move |_, _| {
                counter.set(counter.get() + 1);
                writer.update(|n| *n += 1);
                Ok(())
            },
            WatchOptions {
                expression: "x".into(),
                ..Default::default()
            },
        );
        x.set(1);
        tick();
        assert_eq!(runs.get(), MAX_UPDATE_COUNT + 1);
        assert_eq!(
            *warnings.borrow(),
            ["You may have an infinite update loop in watcher with expression \"x\""]
        );
    }
}

// =============================================================================
// Arrays
// =============================================================================

mod arrays {
    use super::*;

    #[test]
    fn mutators_notify_array_dependents_only() {
        let state = observed(serde_json::json!({"list": [1, 2], "other": 0}));
        let list = state.get("list").as_array().cloned().unwrap_or_default();

        let reader = state.clone();
        let (_list_watch, list_seen) = counting_watch(move || {
            Value::from(reader.get("list").as_array().map(|l| l.len()).unwrap_or_default())
        });
        let reader = state.clone();
        let (_other_watch, other_seen) = counting_watch(move || reader.get("other"));

        list.push(3.into());
        tick();
        list.splice(0, 1, Vec::new());
        tick();
        list.pop();
        tick();
        list.unshift(vec![0.into(), 0.into()]);
        tick();

        assert_eq!(
            *list_seen.borrow(),
            [Value::from(3), Value::from(2), Value::from(1), Value::from(3)]
        );
        assert!(other_seen.borrow().is_empty());
    }

    #[test]
    fn inserted_items_are_observed() {
        let state = observed(serde_json::json!({"list": []}));
        let list = state.get("list").as_array().cloned().unwrap_or_default();
        let item = Value::from_json(&serde_json::json!({"done": false}));
        list.push(item.clone());
        let item = item.as_object().cloned().unwrap_or_default();
        assert!(item.is_observed());

        let reader = item.clone();
        let (_handle, seen) = counting_watch(move || reader.get("done"));
        item.assign("done", Value::Bool(true));
        tick();
        assert_eq!(*seen.borrow(), [Value::Bool(true)]);
    }

    #[test]
    fn sort_and_reverse_notify() {
        let state = observed(serde_json::json!({"list": [3, 1, 2]}));
        let list = state.get("list").as_array().cloned().unwrap_or_default();
        let reader = list.clone();
        let (_handle, seen) = counting_watch(move || {
            Value::from(
                reader
                    .to_vec()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("")
                    .as_str(),
            )
        });
        list.sort_by(|a, b| {
            a.as_number()
                .unwrap_or_default()
                .total_cmp(&b.as_number().unwrap_or_default())
        });
        tick();
        list.reverse();
        tick();
        assert_eq!(*seen.borrow(), [Value::from("123"), Value::from("321")]);
    }
}

// =============================================================================
// Errors
// =============================================================================

mod errors {
    use super::*;

    #[test]
    fn scope_captures_callback_error() {
        configure(|config| config.silent = true);
        let scope = ErrorScope::root("app");
        let captured = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&captured);
        scope.on_error(move |error, info| {
            sink.borrow_mut().push(format!("{} ({})", error, info));
            Ok(Propagation::Stop)
        });
        let n = Reactive::new(0);
        let reader = n.clone();
        let _handle = watch(
            move || Ok(Value::from(reader.get())),
            |_, _| Err(ReactiveError::thrown("callback failed")),
            WatchOptions {
                expression: "n".into(),
                scope: Some(Rc::clone(&scope)),
                ..Default::default()
            },
        );
        n.set(1);
        tick();
        assert_eq!(
            *captured.borrow(),
            ["callback failed (callback for watcher \"n\")"]
        );
        assert!(take_uncaught_errors().is_empty());
    }

    #[test]
    fn failing_getter_keeps_tracking_balanced() {
        configure(|config| config.silent = true);
        let fail = Reactive::new(true);
        let other = Reactive::new(0);
        let reader = fail.clone();
        let _broken = watch(
            move || {
                if reader.get() {
                    Err(ReactiveError::thrown("bad getter"))
                } else {
                    Ok(Value::Null)
                }
            },
            |_, _| Ok(()),
            WatchOptions::default(),
        );
        // the failed run still subscribed to `fail`
        assert_eq!(fail.dep().subscriber_count(), 1);
        // and no later read is attributed to the broken watcher
        let _ = other.get();
        assert_eq!(other.dep().subscriber_count(), 0);
        assert_eq!(take_uncaught_errors().len(), 1);
    }
}
