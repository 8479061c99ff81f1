//! Value helpers referenced by generated render code (`_s`, `_n`, `_q`,
//! `_i`, `_k`, `_b`, `_g`, `_d`, `_p`), and the instance methods templates
//! may call (`$set`, `$delete`).

use sinopia_carton::{camelize, format_compact, hyphenate, must_use_prop, String};
use sinopia_relief::Helper;
use sinopia_tempera::{del, set, traverse, warn, ReactiveObject, Value};

use crate::builtins::{arg, native, parse_float};
use crate::env::Env;
use crate::ops::{property_key, to_number};

/// `_s`: interpolation text. Arrays and plain objects print as indented JSON.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null => String::default(),
        Value::Array(_) | Value::Object(_) => {
            traverse(value);
            serde_json::to_string_pretty(&value.to_json())
                .map(String::from)
                .unwrap_or_default()
        }
        other => format_compact!("{}", other),
    }
}

/// `_n`: `v-model.number`. Values that do not parse are kept as they are.
pub fn to_number_or_keep(value: &Value) -> Value {
    let n = parse_float(&value.to_string());
    if n.is_nan() {
        value.clone()
    } else {
        Value::Number(n)
    }
}

/// `_q`: structural equality, falling back to string comparison.
pub fn loose_equal(a: &Value, b: &Value) -> bool {
    if a.same_value(b) {
        return true;
    }
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            x.len() == y.len() && x.iter().zip(&y).all(|(a, b)| loose_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            let keys = x.keys();
            keys.len() == y.keys().len()
                && keys
                    .iter()
                    .all(|key| y.contains_key(key) && loose_equal(&x.get(key), &y.get(key)))
        }
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => false,
        _ => a.to_string() == b.to_string(),
    }
}

/// `_i`: index of the first loosely equal item, or -1.
pub fn loose_index_of(list: &Value, value: &Value) -> f64 {
    list.as_array()
        .and_then(|arr| arr.to_vec().iter().position(|item| loose_equal(item, value)))
        .map_or(-1.0, |i| i as f64)
}

/// `_k`: true when the event does NOT match the key modifier `key`.
pub fn check_key_codes(
    event_key_code: &Value,
    key: &str,
    builtin_codes: &[u32],
    event_key: &Value,
    builtin_names: &[&str],
) -> bool {
    let event_key = event_key.as_str().filter(|k| !k.is_empty());
    if let (false, Some(event_key)) = (builtin_names.is_empty(), event_key) {
        return !builtin_names.contains(&event_key);
    }
    if !builtin_codes.is_empty() {
        let code = to_number(event_key_code);
        return !builtin_codes.iter().any(|c| f64::from(*c) == code);
    }
    match event_key {
        Some(event_key) => hyphenate(event_key) != key,
        None => matches!(event_key_code, Value::Undefined),
    }
}

fn is_reserved_attribute(key: &str) -> bool {
    matches!(key, "key" | "ref" | "slot" | "slot-scope" | "is")
}

fn child_object(data: &ReactiveObject, key: &str) -> ReactiveObject {
    match data.get(key) {
        Value::Object(obj) => obj,
        _ => {
            let obj = ReactiveObject::new();
            data.assign(key, Value::Object(obj.clone()));
            obj
        }
    }
}

/// `_b`: merge a `v-bind="object"` into element data.
pub fn bind_object_props(data: &ReactiveObject, tag: &str, value: &Value, as_prop: bool, is_sync: bool) {
    let source = match value {
        Value::Undefined | Value::Null | Value::Bool(false) => return,
        Value::Object(obj) => obj.clone(),
        Value::Array(arr) => {
            let merged = ReactiveObject::new();
            for item in arr.to_vec() {
                if let Value::Object(obj) = item {
                    for (key, value) in obj.snapshot() {
                        merged.insert_plain(&key, value);
                    }
                }
            }
            merged
        }
        _ => {
            warn("v-bind without argument expects an Object or Array value");
            return;
        }
    };
    for key in source.keys() {
        let hash = if key == "class" || key == "style" || is_reserved_attribute(&key) {
            data.clone()
        } else {
            let attr_type = match data.get("attrs") {
                Value::Object(attrs) => attrs.get("type").as_str().map(String::from),
                _ => None,
            };
            if as_prop || must_use_prop(tag, attr_type.as_deref(), &key) {
                child_object(data, "domProps")
            } else {
                child_object(data, "attrs")
            }
        };
        if hash.contains_key(&camelize(&key)) || hash.contains_key(&hyphenate(&key)) {
            continue;
        }
        hash.insert_plain(&key, source.get(&key));
        if is_sync {
            let on = child_object(data, "on");
            let target = source.clone();
            let name = key.clone();
            on.insert_plain(
                &format_compact!("update:{}", key),
                native(move |args| {
                    target.assign(&name, arg(args, 0));
                    Ok(Value::Undefined)
                }),
            );
        }
    }
}

/// `_g`: merge a `v-on="object"` into element data. Existing listeners
/// for the same event are kept and run first.
pub fn bind_object_listeners(data: &ReactiveObject, value: &Value) {
    let Value::Object(source) = value else {
        if !value.is_nullish() {
            warn("v-on without argument expects an Object value");
        }
        return;
    };
    let on = child_object(data, "on");
    for (event, ours) in source.snapshot() {
        let merged = match on.get(&event) {
            Value::Undefined => ours,
            Value::Array(existing) => {
                let mut all = existing.to_vec();
                all.push(ours);
                Value::from(all)
            }
            existing => Value::from(vec![existing, ours]),
        };
        on.insert_plain(&event, merged);
    }
}

/// `_d`: write `[key, value, ...]` pairs with dynamic keys into `base`.
pub fn bind_dynamic_keys(base: &Value, values: &Value) -> Value {
    let (Value::Object(obj), Value::Array(pairs)) = (base, values) else {
        return base.clone();
    };
    for pair in pairs.to_vec().chunks(2) {
        match &pair[0] {
            Value::String(key) if !key.is_empty() => {
                obj.insert_plain(key, pair.get(1).cloned().unwrap_or_default());
            }
            Value::String(_) | Value::Null => {}
            other => warn(&format!(
                "Invalid value for dynamic directive argument (expected string or null): {}",
                other
            )),
        }
    }
    base.clone()
}

/// `_p`: prefix a dynamic event name with a modifier marker (`!`, `~`, `&`).
pub fn prepend_modifier(value: &Value, symbol: &str) -> Value {
    match value {
        Value::String(s) => Value::String(format_compact!("{}{}", symbol, s)),
        other => other.clone(),
    }
}

fn code_list(value: &Value) -> Vec<u32> {
    match value {
        Value::Array(arr) => arr.to_vec().iter().map(|v| to_number(v) as u32).collect(),
        Value::Undefined | Value::Null => Vec::new(),
        other => vec![to_number(other) as u32],
    }
}

fn name_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(arr) => arr.to_vec().iter().map(|v| format_compact!("{}", v)).collect(),
        Value::Undefined | Value::Null => Vec::new(),
        other => vec![format_compact!("{}", other)],
    }
}

/// Declare the value helpers on a render scope's root frame.
pub fn install(env: &Env) {
    env.define(
        Helper::ToDisplayString.name(),
        native(|args| Ok(Value::String(to_display_string(&arg(args, 0))))),
    );
    env.define(
        Helper::ToNumber.name(),
        native(|args| Ok(to_number_or_keep(&arg(args, 0)))),
    );
    env.define(
        Helper::LooseEqual.name(),
        native(|args| Ok(Value::Bool(loose_equal(&arg(args, 0), &arg(args, 1))))),
    );
    env.define(
        Helper::LooseIndexOf.name(),
        native(|args| Ok(Value::Number(loose_index_of(&arg(args, 0), &arg(args, 1))))),
    );
    env.define(
        Helper::CheckKeyCodes.name(),
        native(|args| {
            let names = name_list(&arg(args, 4));
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            Ok(Value::Bool(check_key_codes(
                &arg(args, 0),
                &arg(args, 1).to_string(),
                &code_list(&arg(args, 2)),
                &arg(args, 3),
                &names,
            )))
        }),
    );
    env.define(
        Helper::BindObjectProps.name(),
        native(|args| {
            let data = arg(args, 0);
            if let Value::Object(obj) = &data {
                bind_object_props(
                    obj,
                    &arg(args, 1).to_string(),
                    &arg(args, 2),
                    arg(args, 3).is_truthy(),
                    arg(args, 4).is_truthy(),
                );
            }
            Ok(data)
        }),
    );
    env.define(
        Helper::BindObjectListeners.name(),
        native(|args| {
            let data = arg(args, 0);
            if let Value::Object(obj) = &data {
                bind_object_listeners(obj, &arg(args, 1));
            }
            Ok(data)
        }),
    );
    env.define(
        Helper::BindDynamicKeys.name(),
        native(|args| Ok(bind_dynamic_keys(&arg(args, 0), &arg(args, 1)))),
    );
    env.define(
        Helper::PrependModifier.name(),
        native(|args| Ok(prepend_modifier(&arg(args, 0), &arg(args, 1).to_string()))),
    );
    env.define(
        "$set",
        native(|args| Ok(set(&arg(args, 0), &property_key(&arg(args, 1)), arg(args, 2)))),
    );
    env.define(
        "$delete",
        native(|args| {
            del(&arg(args, 0), &property_key(&arg(args, 1)));
            Ok(Value::Undefined)
        }),
    );
}
