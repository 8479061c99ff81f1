//! Installing reactivity on value graphs, and adding or removing
//! properties afterwards.

use std::cell::Cell;

use crate::config::warn;
use crate::dep::Dep;
use crate::value::{Property, ReactiveObject, Value};

thread_local! {
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Pause or resume observation of new containers. While paused,
/// [`observe`] leaves unobserved containers alone.
pub fn toggle_observing(value: bool) {
    SHOULD_OBSERVE.with(|flag| flag.set(value));
}

pub fn is_observing() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Make a container reactive, recursively, and return its self dep.
///
/// Already observed containers return their existing dep. Primitives,
/// frozen containers and anything met while observation is paused
/// return `None`.
pub fn observe(value: &Value) -> Option<Dep> {
    match value {
        Value::Object(obj) => {
            if let Some(dep) = obj.observer_dep() {
                return Some(dep);
            }
            if !is_observing() || obj.is_frozen() {
                return None;
            }
            let dep = obj.install_observer();
            for (key, value) in obj.snapshot() {
                define_reactive(obj, &key, value);
            }
            Some(dep)
        }
        Value::Array(arr) => {
            if let Some(dep) = arr.observer_dep() {
                return Some(dep);
            }
            if !is_observing() || arr.is_frozen() {
                return None;
            }
            let dep = arr.install_observer();
            for item in arr.snapshot() {
                observe(&item);
            }
            Some(dep)
        }
        _ => None,
    }
}

/// Observe the root state of a render scope. Root objects reject new
/// keys through [`set`] and deletions through [`del`].
pub fn observe_root(value: &Value) -> Option<Dep> {
    let dep = observe(value);
    if let Value::Object(obj) = value {
        obj.mark_root();
    }
    dep
}

/// Turn `key` into a reactive property holding `value`, observing the value.
pub fn define_reactive(obj: &ReactiveObject, key: &str, value: Value) {
    define(obj, key, value, false);
}

/// Like [`define_reactive`], but the value itself is not observed and
/// reads do not track its nested deps.
pub fn define_reactive_shallow(obj: &ReactiveObject, key: &str, value: Value) {
    define(obj, key, value, true);
}

fn define(obj: &ReactiveObject, key: &str, value: Value, shallow: bool) {
    if obj.is_frozen() {
        return;
    }
    if !shallow {
        observe(&value);
    }
    obj.define(
        key,
        Property {
            value,
            dep: Some(Dep::new()),
            shallow,
        },
    );
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

fn describe(target: &Value) -> std::string::String {
    match target {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

/// Set a property, adding it reactively (and notifying the container's
/// readers) if it does not exist yet. Array indices go through `splice`.
pub fn set(target: &Value, key: &str, value: Value) -> Value {
    match target {
        Value::Array(arr) => {
            match array_index(key) {
                Some(index) => {
                    arr.grow_to(index);
                    arr.splice(index, 1, vec![value.clone()]);
                }
                None => warn(&format!(
                    "Cannot set non-index property \"{}\" on an array",
                    key
                )),
            }
            value
        }
        Value::Object(obj) => {
            if obj.contains_key(key) {
                obj.assign(key, value.clone());
                return value;
            }
            if obj.is_root() {
                warn(
                    "Avoid adding reactive properties to a render scope or its root data at runtime - declare it upfront in the data option.",
                );
                return value;
            }
            if obj.is_frozen() {
                return value;
            }
            match obj.observer_dep() {
                Some(dep) => {
                    define_reactive(obj, key, value.clone());
                    dep.notify();
                }
                None => obj.insert_plain(key, value.clone()),
            }
            value
        }
        _ => {
            warn(&format!(
                "Cannot set reactive property on undefined, null, or primitive value: {}",
                describe(target)
            ));
            value
        }
    }
}

/// Delete a property and notify the container's readers.
pub fn del(target: &Value, key: &str) {
    match target {
        Value::Array(arr) => {
            if let Some(index) = array_index(key) {
                arr.splice(index, 1, Vec::new());
            }
        }
        Value::Object(obj) => {
            if obj.is_root() {
                warn("Avoid deleting properties on a render scope or its root data - just set it to null.");
                return;
            }
            if !obj.contains_key(key) {
                return;
            }
            if obj.is_frozen() {
                warn(&format!("Cannot delete property \"{}\" of a frozen object", key));
                return;
            }
            obj.remove(key);
            if let Some(dep) = obj.observer_dep() {
                dep.notify();
            }
        }
        _ => warn(&format!(
            "Cannot delete reactive property on undefined, null, or primitive value: {}",
            describe(target)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::configure;
    use crate::value::ReactiveArray;
    use crate::watcher::{Watcher, WatcherOptions};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn capture_warnings() -> Rc<RefCell<Vec<std::string::String>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        configure(|config| {
            config.warn_handler = Some(Rc::new(move |msg: &str| sink.borrow_mut().push(msg.to_string())));
        });
        seen
    }

    fn sync_watch(f: impl Fn() -> Value + 'static) -> (Rc<Watcher>, Rc<Cell<u32>>) {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let watcher = Watcher::new(
            "test",
            move || {
                counter.set(counter.get() + 1);
                Ok(f())
            },
            None,
            WatcherOptions {
                sync: true,
                ..Default::default()
            },
        );
        (watcher, runs)
    }

    #[test]
    fn test_observe_is_idempotent() {
        let value = Value::from_json(&serde_json::json!({"a": {"b": 1}, "list": [{"c": 2}]}));
        let dep = observe(&value);
        assert!(dep.is_some());
        assert_eq!(observe(&value), dep);
        let obj = value.as_object().cloned().unwrap_or_default();
        assert!(obj.is_reactive_property("a"));
        assert!(obj.get("a").as_object().is_some_and(|a| a.is_reactive_property("b")));
        let list = obj.get("list");
        let first = list.as_array().map(|l| l.get(0)).unwrap_or_default();
        assert!(first.as_object().is_some_and(ReactiveObject::is_observed));
        assert_eq!(observe(&Value::from(1)), None);
    }

    #[test]
    fn test_same_value_write_does_not_notify() {
        let value = Value::from_json(&serde_json::json!({"n": null}));
        observe(&value);
        let obj = value.as_object().cloned().unwrap_or_default();
        obj.assign("n", Value::Number(f64::NAN));
        let reader = obj.clone();
        let (_watcher, runs) = sync_watch(move || reader.get("n"));
        obj.assign("n", Value::Number(f64::NAN));
        assert_eq!(runs.get(), 1);
        obj.assign("n", 1.into());
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_set_adds_reactive_property() {
        let value = Value::from_json(&serde_json::json!({"inner": {}}));
        observe(&value);
        let obj = value.as_object().cloned().unwrap_or_default();
        let reader = obj.clone();
        let (_watcher, runs) = sync_watch(move || {
            reader.get("inner").as_object().map(|o| o.get("x")).unwrap_or_default()
        });
        let inner = obj.get("inner");
        set(&inner, "x", 1.into());
        assert_eq!(runs.get(), 2);
        assert!(inner.as_object().is_some_and(|o| o.is_reactive_property("x")));
        if let Some(inner) = inner.as_object() {
            inner.assign("x", 2.into());
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn test_direct_insert_is_not_reactive() {
        let value = Value::from_json(&serde_json::json!({}));
        observe(&value);
        let obj = value.as_object().cloned().unwrap_or_default();
        obj.insert_plain("late", 1.into());
        let reader = obj.clone();
        let (_watcher, runs) = sync_watch(move || reader.get("late"));
        obj.assign("late", 2.into());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_new_nested_value_is_observed() {
        let value = Value::from_json(&serde_json::json!({"child": null}));
        observe(&value);
        let obj = value.as_object().cloned().unwrap_or_default();
        let fresh = Value::from_json(&serde_json::json!({"deep": 1}));
        obj.assign("child", fresh.clone());
        assert!(fresh.as_object().is_some_and(ReactiveObject::is_observed));
    }

    #[test]
    fn test_array_set_and_del() {
        let arr = ReactiveArray::from_vec(vec![1.into()]);
        let value = Value::Array(arr.clone());
        observe(&value);
        let reader = arr.clone();
        let (_watcher, runs) = sync_watch(move || Value::from(reader.len()));
        set(&value, "3", 4.into());
        assert_eq!(runs.get(), 2);
        assert_eq!(arr.snapshot(), [1.into(), Value::Undefined, Value::Undefined, 4.into()]);
        del(&value, "0");
        assert_eq!(runs.get(), 3);
        assert_eq!(arr.snapshot().len(), 3);
    }

    #[test]
    fn test_del_notifies() {
        let value = Value::from_json(&serde_json::json!({"a": 1}));
        observe(&value);
        let obj = value.as_object().cloned().unwrap_or_default();
        let reader = obj.clone();
        let (_watcher, runs) = sync_watch(move || Value::from(reader.keys().len()));
        del(&value, "a");
        assert_eq!(runs.get(), 2);
        assert!(!obj.contains_key("a"));
        del(&value, "missing");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_misuse_warnings() {
        let seen = capture_warnings();
        set(&Value::Null, "a", 1.into());
        del(&Value::from("s"), "a");

        let root = Value::from_json(&serde_json::json!({"a": 1}));
        observe_root(&root);
        set(&root, "b", 1.into());
        del(&root, "a");

        let frozen = Value::from_json(&serde_json::json!({"a": 1}));
        if let Some(obj) = frozen.as_object() {
            obj.freeze();
        }
        del(&frozen, "a");

        assert_eq!(
            *seen.borrow(),
            [
                "Cannot set reactive property on undefined, null, or primitive value: null",
                "Cannot delete reactive property on undefined, null, or primitive value: \"s\"",
                "Avoid adding reactive properties to a render scope or its root data at runtime - declare it upfront in the data option.",
                "Avoid deleting properties on a render scope or its root data - just set it to null.",
                "Cannot delete property \"a\" of a frozen object",
            ]
        );
        assert!(root.as_object().is_some_and(|o| !o.contains_key("b")));
        configure(|config| config.warn_handler = None);
    }

    #[test]
    fn test_paused_observation() {
        toggle_observing(false);
        let value = Value::from_json(&serde_json::json!({"a": 1}));
        assert_eq!(observe(&value), None);
        toggle_observing(true);
        assert!(observe(&value).is_some());
    }
}
