//! The globals templates may reference, and the methods of primitive and
//! container values.

use std::cell::RefCell;
use std::cmp::Ordering;

use sinopia_carton::{format_compact, FxHashMap, String};
use sinopia_tempera::{format_number, traverse, Callable, ReactiveArray, ReactiveError, ReactiveObject, Value};

use crate::error::{EvalError, EvalResult};
use crate::ops::{array_index, property_key, strict_equals, to_number};

// ============================================================================
// Calling
// ============================================================================

/// Wrap a native function as a callable value.
pub fn native(f: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Value {
    Value::Function(Callable::new(move |args| f(args).map_err(ReactiveError::from)))
}

/// The `index`th argument, `undefined` when missing.
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Call `callee` if it is a function.
pub fn call(callee: &Value, args: &[Value], name: &str) -> EvalResult<Value> {
    match callee {
        Value::Function(f) => Ok(f.call(args)?),
        _ => Err(EvalError::type_error(format_compact!("{} is not a function", name))),
    }
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    Value::Object(ReactiveObject::from_pairs(
        entries.into_iter().map(|(k, v)| (String::from(k), v)),
    ))
}

fn math_fn(f: fn(f64) -> f64) -> Value {
    native(move |args| Ok(Value::Number(f(to_number(&arg(args, 0))))))
}

fn optional_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    relative_index(to_number(value), len)
}

/// Clamp a possibly negative index (`slice`, `splice`) into `0..=len`.
fn relative_index(n: f64, len: usize) -> usize {
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

// ============================================================================
// Globals
// ============================================================================

thread_local! {
    static GLOBALS: FxHashMap<&'static str, Value> = build_globals();
}

/// Look up an allowed global.
pub fn global(name: &str) -> Option<Value> {
    GLOBALS.with(|globals| globals.get(name).cloned())
}

fn build_globals() -> FxHashMap<&'static str, Value> {
    let mut globals = FxHashMap::default();
    globals.insert("undefined", Value::Undefined);
    globals.insert("NaN", Value::Number(f64::NAN));
    globals.insert("Infinity", Value::Number(f64::INFINITY));
    globals.insert(
        "isNaN",
        native(|args| Ok(Value::Bool(to_number(&arg(args, 0)).is_nan()))),
    );
    globals.insert(
        "isFinite",
        native(|args| Ok(Value::Bool(to_number(&arg(args, 0)).is_finite()))),
    );
    globals.insert(
        "parseFloat",
        native(|args| Ok(Value::Number(parse_float(&arg(args, 0).to_string())))),
    );
    globals.insert(
        "parseInt",
        native(|args| {
            let radix = match arg(args, 1) {
                Value::Undefined => 0,
                radix => to_number(&radix) as u32,
            };
            Ok(Value::Number(parse_int(&arg(args, 0).to_string(), radix)))
        }),
    );
    globals.insert(
        "String",
        native(|args| {
            Ok(match args.first() {
                Some(value) => Value::String(format_compact!("{}", value)),
                None => Value::from(""),
            })
        }),
    );
    globals.insert(
        "Number",
        native(|args| {
            Ok(Value::Number(match args.first() {
                Some(value) => to_number(value),
                None => 0.0,
            }))
        }),
    );
    globals.insert(
        "Boolean",
        native(|args| Ok(Value::Bool(arg(args, 0).is_truthy()))),
    );
    globals.insert("Math", math());
    globals.insert("JSON", json());
    globals.insert(
        "Array",
        object(vec![
            (
                "isArray",
                native(|args| Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))),
            ),
            (
                "from",
                native(|args| {
                    let items = match arg(args, 0) {
                        Value::Array(arr) => arr.to_vec(),
                        Value::String(s) => s.chars().map(|c| Value::String(format_compact!("{}", c))).collect(),
                        _ => Vec::new(),
                    };
                    Ok(Value::from(items))
                }),
            ),
        ]),
    );
    globals.insert(
        "Object",
        object(vec![
            (
                "keys",
                native(|args| Ok(Value::from(own_keys(&arg(args, 0))))),
            ),
            (
                "values",
                native(|args| {
                    let target = arg(args, 0);
                    let keys = own_keys(&target);
                    keys.iter()
                        .map(|key| crate::eval::get_member(&target, &key.to_string()))
                        .collect::<EvalResult<Vec<_>>>()
                        .map(Value::from)
                }),
            ),
            (
                "entries",
                native(|args| {
                    let target = arg(args, 0);
                    let keys = own_keys(&target);
                    keys.into_iter()
                        .map(|key| {
                            let value = crate::eval::get_member(&target, &key.to_string())?;
                            Ok(Value::from(vec![key, value]))
                        })
                        .collect::<EvalResult<Vec<_>>>()
                        .map(Value::from)
                }),
            ),
            (
                "assign",
                native(|args| {
                    let target = arg(args, 0);
                    if let Value::Object(obj) = &target {
                        for source in args.iter().skip(1) {
                            if let Value::Object(source) = source {
                                for key in source.keys() {
                                    obj.assign(&key, source.get(&key));
                                }
                            }
                        }
                    }
                    Ok(target)
                }),
            ),
        ]),
    );
    globals
}

fn own_keys(target: &Value) -> Vec<Value> {
    match target {
        Value::Object(obj) => obj.keys().into_iter().map(Value::String).collect(),
        Value::Array(arr) => (0..arr.len()).map(|i| Value::String(format_compact!("{}", i))).collect(),
        Value::String(s) => (0..s.chars().count())
            .map(|i| Value::String(format_compact!("{}", i)))
            .collect(),
        _ => Vec::new(),
    }
}

fn math() -> Value {
    let extremum = |pick: fn(f64, f64) -> f64, init: f64| {
        native(move |args| {
            let mut acc = init;
            for value in args {
                let n = to_number(value);
                if n.is_nan() {
                    return Ok(Value::Number(f64::NAN));
                }
                acc = pick(acc, n);
            }
            Ok(Value::Number(acc))
        })
    };
    object(vec![
        ("PI", Value::Number(std::f64::consts::PI)),
        ("E", Value::Number(std::f64::consts::E)),
        ("abs", math_fn(f64::abs)),
        ("floor", math_fn(f64::floor)),
        ("ceil", math_fn(f64::ceil)),
        ("round", math_fn(|n| (n + 0.5).floor())),
        ("trunc", math_fn(f64::trunc)),
        ("sqrt", math_fn(f64::sqrt)),
        (
            "sign",
            math_fn(|n| if n.is_nan() || n == 0.0 { n } else { n.signum() }),
        ),
        ("max", extremum(f64::max, f64::NEG_INFINITY)),
        ("min", extremum(f64::min, f64::INFINITY)),
        (
            "pow",
            native(|args| {
                Ok(Value::Number(
                    to_number(&arg(args, 0)).powf(to_number(&arg(args, 1))),
                ))
            }),
        ),
    ])
}

fn json() -> Value {
    object(vec![
        (
            "stringify",
            native(|args| {
                let value = arg(args, 0);
                if matches!(value, Value::Undefined | Value::Function(_)) {
                    return Ok(Value::Undefined);
                }
                traverse(&value);
                let indent = args.get(2).map(to_number).unwrap_or(0.0);
                let json = value.to_json();
                let text = if indent > 0.0 {
                    serde_json::to_string_pretty(&json)
                } else {
                    serde_json::to_string(&json)
                };
                text.map(|s| Value::String(s.into()))
                    .map_err(|e| EvalError::Thrown(format_compact!("TypeError: {}", e)))
            }),
        ),
        (
            "parse",
            native(|args| {
                serde_json::from_str::<serde_json::Value>(&arg(args, 0).to_string())
                    .map(|json| Value::from_json(&json))
                    .map_err(|e| EvalError::Thrown(format_compact!("SyntaxError: {}", e)))
            }),
        ),
    ])
}

/// `parseFloat`: the longest numeric prefix.
pub fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    let rest = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
    if rest.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = rest.as_bytes();
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => {
                let digits_follow = match bytes.get(end + 1) {
                    Some(b'+' | b'-') => bytes.get(end + 2).is_some_and(u8::is_ascii_digit),
                    Some(b) => b.is_ascii_digit(),
                    None => false,
                };
                if !digits_follow {
                    break;
                }
                seen_exp = true;
                if matches!(bytes.get(end + 1), Some(b'+' | b'-')) {
                    end += 1;
                }
            }
            _ => break,
        }
        end += 1;
    }
    rest[..end]
        .parse::<f64>()
        .map(|n| sign * n)
        .unwrap_or(f64::NAN)
}

/// `parseInt`: the longest integer prefix in `radix` (0 picks 10 or 16).
pub fn parse_int(s: &str, radix: u32) -> f64 {
    let s = s.trim_start();
    let rest = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    let sign = if s.starts_with('-') { -1.0 } else { 1.0 };
    let (rest, radix) = match (radix, rest.get(..2)) {
        (0 | 16, Some("0x" | "0X")) => (&rest[2..], 16),
        (0, _) => (rest, 10),
        (r, _) => (rest, r),
    };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let mut result: Option<f64> = None;
    for c in rest.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        result = Some(result.unwrap_or(0.0) * f64::from(radix) + f64::from(digit));
    }
    result.map(|n| sign * n).unwrap_or(f64::NAN)
}

// ============================================================================
// Methods
// ============================================================================

/// The method `name` of a primitive or container, bound to `receiver`.
pub fn method(receiver: &Value, name: &str) -> Option<Value> {
    match receiver {
        Value::Array(arr) => array_method(arr, name),
        Value::String(s) => string_method(s, name),
        Value::Number(n) => number_method(*n, name),
        Value::Object(obj) => object_method(obj, name),
        _ => None,
    }
}

fn object_method(obj: &ReactiveObject, name: &str) -> Option<Value> {
    let obj = obj.clone();
    Some(match name {
        "hasOwnProperty" => native(move |args| Ok(Value::Bool(obj.contains_key(&property_key(&arg(args, 0)))))),
        "toString" => native(|_| Ok(Value::from("[object Object]"))),
        _ => return None,
    })
}

fn number_method(n: f64, name: &str) -> Option<Value> {
    Some(match name {
        "toFixed" => native(move |args| {
            let digits = to_number(&arg(args, 0));
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 100.0) as usize };
            Ok(Value::String(format_compact!("{:.*}", digits, n)))
        }),
        "toString" => native(move |args| {
            let radix = to_number(&arg(args, 0));
            if radix.is_nan() || radix == 10.0 || n.fract() != 0.0 || n < 0.0 {
                return Ok(Value::String(format_number(n).into()));
            }
            Ok(Value::String(to_radix(n as u64, radix as u32).into()))
        }),
        _ => return None,
    })
}

fn to_radix(mut n: u64, radix: u32) -> std::string::String {
    let radix = radix.clamp(2, 36);
    if n == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(std::char::from_digit((n % u64::from(radix)) as u32, radix).unwrap_or('0'));
        n /= u64::from(radix);
    }
    digits.iter().rev().collect()
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

fn char_index_of(s: &str, needle: &str, from: usize) -> Option<usize> {
    let offset = s.char_indices().nth(from).map(|(i, _)| i).unwrap_or(s.len());
    s[offset..]
        .find(needle)
        .map(|byte| from + s[offset..offset + byte].chars().count())
}

/// Longest string a template may build with `repeat` or `padStart`.
const MAX_STRING_LENGTH: f64 = ((1u64 << 29) - 24) as f64;

fn invalid_string_length() -> EvalError {
    EvalError::Thrown(String::from("RangeError: Invalid string length"))
}

fn pad(s: &str, args: &[Value], at_start: bool) -> EvalResult<Value> {
    let target = to_number(&arg(args, 0));
    let fill = match arg(args, 1) {
        Value::Undefined => String::from(" "),
        other => format_compact!("{}", other),
    };
    let len = s.chars().count();
    if target.is_nan() || target <= len as f64 || fill.is_empty() {
        return Ok(Value::from(s));
    }
    if target > MAX_STRING_LENGTH {
        return Err(invalid_string_length());
    }
    let padding: String = fill.chars().cycle().take(target as usize - len).collect();
    Ok(Value::String(if at_start {
        format_compact!("{}{}", padding, s)
    } else {
        format_compact!("{}{}", s, padding)
    }))
}

fn string_method(s: &String, name: &str) -> Option<Value> {
    let s = s.clone();
    Some(match name {
        "toUpperCase" => native(move |_| Ok(Value::String(s.to_uppercase().into()))),
        "toLowerCase" => native(move |_| Ok(Value::String(s.to_lowercase().into()))),
        "trim" => native(move |_| Ok(Value::from(s.trim()))),
        "trimStart" => native(move |_| Ok(Value::from(s.trim_start()))),
        "trimEnd" => native(move |_| Ok(Value::from(s.trim_end()))),
        "toString" | "valueOf" => native(move |_| Ok(Value::String(s.clone()))),
        "charAt" => native(move |args| {
            let index = to_number(&arg(args, 0));
            let index = if index.is_nan() { 0.0 } else { index };
            Ok(Value::String(
                s.chars()
                    .nth(index as usize)
                    .filter(|_| index >= 0.0)
                    .map(|c| format_compact!("{}", c))
                    .unwrap_or_default(),
            ))
        }),
        "includes" => native(move |args| Ok(Value::Bool(s.contains(arg(args, 0).to_string().as_str())))),
        "startsWith" => native(move |args| Ok(Value::Bool(s.starts_with(arg(args, 0).to_string().as_str())))),
        "endsWith" => native(move |args| Ok(Value::Bool(s.ends_with(arg(args, 0).to_string().as_str())))),
        "indexOf" => native(move |args| {
            let needle = arg(args, 0).to_string();
            let from = optional_index(&arg(args, 1), s.chars().count(), 0);
            Ok(Value::Number(
                char_index_of(&s, &needle, from).map_or(-1.0, |i| i as f64),
            ))
        }),
        "slice" => native(move |args| {
            let len = s.chars().count();
            let start = optional_index(&arg(args, 0), len, 0);
            let end = optional_index(&arg(args, 1), len, len);
            Ok(Value::String(char_slice(&s, start, end)))
        }),
        "substring" => native(move |args| {
            let len = s.chars().count();
            let clamp = |v: Value, default: usize| match v {
                Value::Undefined => default,
                v => {
                    let n = to_number(&v);
                    if n.is_nan() { 0 } else { n.clamp(0.0, len as f64) as usize }
                }
            };
            let (a, b) = (clamp(arg(args, 0), 0), clamp(arg(args, 1), len));
            Ok(Value::String(char_slice(&s, a.min(b), a.max(b))))
        }),
        "split" => native(move |args| {
            let limit = match arg(args, 1) {
                Value::Undefined => usize::MAX,
                n => to_number(&n) as usize,
            };
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::String(s.clone())],
                sep => {
                    let sep = sep.to_string();
                    if sep.is_empty() {
                        s.chars().map(|c| Value::String(format_compact!("{}", c))).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::from).collect()
                    }
                }
            };
            Ok(Value::from(parts.into_iter().take(limit).collect::<Vec<_>>()))
        }),
        "replace" | "replaceAll" => {
            let all = name == "replaceAll";
            native(move |args| {
                let pattern = arg(args, 0).to_string();
                let replacement = arg(args, 1);
                let mut out = std::string::String::new();
                let mut rest = s.as_str();
                while let Some(at) = rest.find(pattern.as_str()) {
                    out.push_str(&rest[..at]);
                    let piece = match &replacement {
                        Value::Function(_) => call(&replacement, &[Value::from(pattern.as_str())], "replacer")?.to_string(),
                        other => other.to_string(),
                    };
                    out.push_str(&piece);
                    rest = &rest[at + pattern.len()..];
                    if !all || pattern.is_empty() {
                        break;
                    }
                }
                out.push_str(rest);
                Ok(Value::String(out.into()))
            })
        }
        "repeat" => native(move |args| {
            let count = to_number(&arg(args, 0));
            if count < 0.0 || count.is_infinite() {
                return Err(EvalError::Thrown(format_compact!(
                    "RangeError: Invalid count value: {}",
                    format_number(count)
                )));
            }
            let count = if count.is_nan() { 0.0 } else { count.trunc() };
            if !s.is_empty() && count * s.chars().count() as f64 > MAX_STRING_LENGTH {
                return Err(invalid_string_length());
            }
            Ok(Value::String(s.repeat(count as usize).into()))
        }),
        "padStart" => native(move |args| pad(&s, args, true)),
        "padEnd" => native(move |args| pad(&s, args, false)),
        "concat" => native(move |args| {
            let mut out = std::string::String::from(s.as_str());
            for value in args {
                out.push_str(&value.to_string());
            }
            Ok(Value::String(out.into()))
        }),
        _ => return None,
    })
}

fn callback_arg(args: &[Value], method: &str) -> EvalResult<Value> {
    match arg(args, 0) {
        f @ Value::Function(_) => Ok(f),
        other => Err(EvalError::type_error(format_compact!(
            "{} is not a function in Array.prototype.{}",
            other,
            method
        ))),
    }
}

/// Run `f(item, index, array)` over a snapshot of the items.
fn each(
    arr: &ReactiveArray,
    args: &[Value],
    method: &str,
    mut visit: impl FnMut(usize, &Value, Value) -> EvalResult<bool>,
) -> EvalResult<()> {
    let f = callback_arg(args, method)?;
    for (i, item) in arr.to_vec().into_iter().enumerate() {
        let result = call(
            &f,
            &[item.clone(), Value::from(i), Value::Array(arr.clone())],
            method,
        )?;
        if !visit(i, &item, result)? {
            break;
        }
    }
    Ok(())
}

fn default_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Undefined, Value::Undefined) => Ordering::Equal,
        (Value::Undefined, _) => Ordering::Greater,
        (_, Value::Undefined) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn array_method(arr: &ReactiveArray, name: &str) -> Option<Value> {
    let arr = arr.clone();
    Some(match name {
        "push" => native(move |args| {
            let mut len = arr.len();
            for value in args {
                len = arr.push(value.clone());
            }
            Ok(Value::from(len))
        }),
        "pop" => native(move |_| Ok(arr.pop())),
        "shift" => native(move |_| Ok(arr.shift())),
        "unshift" => native(move |args| Ok(Value::from(arr.unshift(args.to_vec())))),
        "splice" => native(move |args| {
            let len = arr.len();
            let start = optional_index(&arg(args, 0), len, 0);
            let delete_count = match args.get(1) {
                None => len - start,
                Some(n) => {
                    let n = to_number(n);
                    if n.is_nan() { 0 } else { (n.max(0.0) as usize).min(len - start) }
                }
            };
            let inserted = args.iter().skip(2).cloned().collect();
            Ok(Value::from(arr.splice(start, delete_count, inserted)))
        }),
        "reverse" => native(move |_| {
            arr.reverse();
            Ok(Value::Array(arr.clone()))
        }),
        "sort" => native(move |args| {
            let compare = arg(args, 0);
            let failure: RefCell<Option<EvalError>> = RefCell::new(None);
            arr.sort_by(|a, b| match &compare {
                Value::Function(_) => {
                    if failure.borrow().is_some() {
                        return Ordering::Equal;
                    }
                    match call(&compare, &[a.clone(), b.clone()], "comparator") {
                        Ok(result) => to_number(&result).partial_cmp(&0.0).unwrap_or(Ordering::Equal),
                        Err(e) => {
                            *failure.borrow_mut() = Some(e);
                            Ordering::Equal
                        }
                    }
                }
                _ => default_compare(a, b),
            });
            match failure.into_inner() {
                Some(e) => Err(e),
                None => Ok(Value::Array(arr.clone())),
            }
        }),
        "map" => native(move |args| {
            let mut out = Vec::new();
            each(&arr, args, "map", |_, _, result| {
                out.push(result);
                Ok(true)
            })?;
            Ok(Value::from(out))
        }),
        "filter" => native(move |args| {
            let mut out = Vec::new();
            each(&arr, args, "filter", |_, item, result| {
                if result.is_truthy() {
                    out.push(item.clone());
                }
                Ok(true)
            })?;
            Ok(Value::from(out))
        }),
        "forEach" => native(move |args| {
            each(&arr, args, "forEach", |_, _, _| Ok(true))?;
            Ok(Value::Undefined)
        }),
        "find" => native(move |args| {
            let mut found = Value::Undefined;
            each(&arr, args, "find", |_, item, result| {
                if result.is_truthy() {
                    found = item.clone();
                    return Ok(false);
                }
                Ok(true)
            })?;
            Ok(found)
        }),
        "findIndex" => native(move |args| {
            let mut found = -1.0;
            each(&arr, args, "findIndex", |i, _, result| {
                if result.is_truthy() {
                    found = i as f64;
                    return Ok(false);
                }
                Ok(true)
            })?;
            Ok(Value::Number(found))
        }),
        "some" => native(move |args| {
            let mut any = false;
            each(&arr, args, "some", |_, _, result| {
                any = result.is_truthy();
                Ok(!any)
            })?;
            Ok(Value::Bool(any))
        }),
        "every" => native(move |args| {
            let mut all = true;
            each(&arr, args, "every", |_, _, result| {
                all = result.is_truthy();
                Ok(all)
            })?;
            Ok(Value::Bool(all))
        }),
        "reduce" => native(move |args| {
            let f = callback_arg(args, "reduce")?;
            let items = arr.to_vec();
            let mut iter = items.into_iter().enumerate();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => match iter.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(EvalError::type_error(
                            "Reduce of empty array with no initial value",
                        ))
                    }
                },
            };
            for (i, item) in iter {
                acc = call(
                    &f,
                    &[acc, item, Value::from(i), Value::Array(arr.clone())],
                    "reduce",
                )?;
            }
            Ok(acc)
        }),
        "includes" => native(move |args| {
            let needle = arg(args, 0);
            Ok(Value::Bool(arr.to_vec().iter().any(|item| item.same_value(&needle))))
        }),
        "indexOf" => native(move |args| {
            let needle = arg(args, 0);
            let index = arr.to_vec().iter().position(|item| strict_equals(item, &needle));
            Ok(Value::Number(index.map_or(-1.0, |i| i as f64)))
        }),
        "join" => native(move |args| {
            let sep = match arg(args, 0) {
                Value::Undefined => String::from(","),
                other => format_compact!("{}", other),
            };
            let parts: Vec<std::string::String> = arr
                .to_vec()
                .iter()
                .map(|item| if item.is_nullish() { std::string::String::new() } else { item.to_string() })
                .collect();
            Ok(Value::String(parts.join(sep.as_str()).into()))
        }),
        "toString" => native(move |_| Ok(Value::String(format_compact!("{}", Value::Array(arr.clone()))))),
        "slice" => native(move |args| {
            let items = arr.to_vec();
            let start = optional_index(&arg(args, 0), items.len(), 0);
            let end = optional_index(&arg(args, 1), items.len(), items.len());
            Ok(Value::from(items.get(start..end.max(start)).map(<[Value]>::to_vec).unwrap_or_default()))
        }),
        "concat" => native(move |args| {
            let mut items = arr.to_vec();
            for value in args {
                match value {
                    Value::Array(other) => items.extend(other.to_vec()),
                    other => items.push(other.clone()),
                }
            }
            Ok(Value::from(items))
        }),
        _ => return None,
    })
}

/// Read `key` of an array by index.
pub fn array_element(arr: &ReactiveArray, key: &str) -> Option<Value> {
    array_index(key).map(|index| arr.get(index))
}
