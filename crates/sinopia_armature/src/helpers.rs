//! Attribute helpers shared by the tree builder, platform modules and
//! directive generators.

use sinopia_carton::{format_compact, js_string, String};
use sinopia_relief::{Diagnostics, ElementNode, Handler, Modifiers, SourceRange};

use crate::filter_parser::parse_filters;

/// Take a binding (`:name` / `v-bind:name`) and return its expression,
/// falling back to the static attribute as a string literal when
/// `get_static` is set.
pub fn get_binding_attr(el: &mut ElementNode, name: &str, get_static: bool) -> Option<String> {
    let shorthand = el.take_attr(&format!(":{}", name));
    let dynamic = match shorthand {
        Some(value) if !value.is_empty() => Some(value),
        _ => el.take_attr(&format!("v-bind:{}", name)),
    };
    if let Some(value) = dynamic {
        return Some(parse_filters(&value).into());
    }
    if get_static {
        if let Some(value) = el.take_attr(name) {
            return Some(js_string(&value).into());
        }
    }
    None
}

/// Source range of whichever form of the binding was written.
pub fn raw_binding_attr_range(el: &ElementNode, name: &str) -> Option<SourceRange> {
    el.raw_attr_range(&format!(":{}", name))
        .or_else(|| el.raw_attr_range(&format!("v-bind:{}", name)))
        .or_else(|| el.raw_attr_range(name))
}

/// The part of an attribute name modifiers may appear in: after any
/// dynamic `[...]` argument.
fn modifier_segment(name: &str) -> (usize, &str) {
    let start = name.rfind(']').map_or(0, |i| i + 1);
    (start, &name[start..])
}

/// `.mod` suffixes of a directive attribute name.
pub fn parse_modifiers(name: &str) -> Option<Modifiers> {
    let (_, segment) = modifier_segment(name);
    let mut parts = segment.split('.');
    parts.next();
    let modifiers: Modifiers = parts.filter(|m| !m.is_empty()).collect();
    if modifiers.is_empty() {
        None
    } else {
        Some(modifiers)
    }
}

/// Attribute name with its modifiers removed.
pub fn strip_modifiers(name: &str) -> &str {
    let (start, segment) = modifier_segment(name);
    match segment.find('.') {
        Some(i) => &name[..start + i],
        None => name,
    }
}

fn prepend_modifier_marker(symbol: char, name: &str, dynamic: bool) -> String {
    if dynamic {
        format_compact!("_p({},\"{}\")", name, symbol)
    } else {
        format_compact!("{}{}", symbol, name)
    }
}

/// Register a `v-on` handler.
///
/// `.capture`, `.once` and `.passive` are folded into the event name as
/// `!`, `~` and `&` markers, `.native` selects the native listener map, and
/// `click.right` / `click.middle` become `contextmenu` / `mouseup`.
#[allow(clippy::too_many_arguments)]
pub fn add_handler(
    el: &mut ElementNode,
    name: &str,
    value: &str,
    modifiers: Option<Modifiers>,
    important: bool,
    diag: Option<&mut Diagnostics>,
    range: Option<SourceRange>,
    dynamic: bool,
) {
    let mut name = String::from(name);
    let mut modifiers = modifiers;

    if let (Some(diag), Some(mods)) = (diag, &modifiers) {
        if mods.contains("prevent") && mods.contains("passive") {
            diag.warn(
                "passive and prevent can't be used together. Passive handler can't prevent default event.",
                range,
            );
        }
    }

    if let Some(mods) = modifiers.as_mut() {
        if mods.contains("right") {
            if dynamic {
                name = format_compact!("({})==='click'?'contextmenu':({})", name, name);
            } else if name.as_str() == "click" {
                name = String::from("contextmenu");
                mods.remove("right");
            }
        } else if mods.contains("middle") {
            if dynamic {
                name = format_compact!("({})==='click'?'mouseup':({})", name, name);
            } else if name.as_str() == "click" {
                name = String::from("mouseup");
            }
        }

        if mods.remove("capture") {
            name = prepend_modifier_marker('!', &name, dynamic);
        }
        if mods.remove("once") {
            name = prepend_modifier_marker('~', &name, dynamic);
        }
        if mods.remove("passive") {
            name = prepend_modifier_marker('&', &name, dynamic);
        }
    }

    let native = modifiers.as_mut().is_some_and(|mods| mods.remove("native"));
    let handler = Handler {
        value: String::from(value.trim()),
        dynamic,
        modifiers,
        range,
    };
    let events = if native {
        &mut el.native_events
    } else {
        &mut el.events
    };
    events.add(name, handler, important);
    el.plain = false;
}

/// A `v-model` target split into the object expression and the key set on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPath {
    pub exp: String,
    /// `None` when the target is a bare identifier.
    pub key: Option<String>,
}

/// Split a model target: `a.b.c` → (`a.b`, `"c"`), `a[b][c]` → (`a[b]`, `c`).
pub fn parse_model(value: &str) -> ModelPath {
    let val = value.trim();
    let len = val.len();

    if !val.contains('[') || val.rfind(']').map_or(true, |i| i < len - 1) {
        return match val.rfind('.') {
            Some(index) => ModelPath {
                exp: String::from(&val[..index]),
                key: Some(format_compact!("\"{}\"", &val[index + 1..])),
            },
            None => ModelPath {
                exp: String::from(val),
                key: None,
            },
        };
    }

    let bytes = val.as_bytes();
    let mut index = 0usize;
    let mut expression_pos = 0usize;
    let mut expression_end_pos = 0usize;

    let skip_string = |index: &mut usize, quote: u8| {
        while *index + 1 < len {
            *index += 1;
            if bytes[*index] == quote {
                break;
            }
        }
    };

    // the first character never opens the key bracket
    while index + 1 < len {
        index += 1;
        let chr = bytes[index];
        if chr == b'"' || chr == b'\'' {
            skip_string(&mut index, chr);
        } else if chr == b'[' {
            let mut in_bracket = 1;
            expression_pos = index;
            while index + 1 < len {
                index += 1;
                let chr = bytes[index];
                if chr == b'"' || chr == b'\'' {
                    skip_string(&mut index, chr);
                    continue;
                }
                if chr == b'[' {
                    in_bracket += 1;
                }
                if chr == b']' {
                    in_bracket -= 1;
                }
                if in_bracket == 0 {
                    expression_end_pos = index;
                    break;
                }
            }
        }
    }

    ModelPath {
        exp: String::from(&val[..expression_pos]),
        key: Some(String::from(
            val.get(expression_pos + 1..expression_end_pos).unwrap_or_default(),
        )),
    }
}

/// Statement assigning `assignment` to the model target, going through
/// `$set` when the target is a property.
pub fn gen_assignment_code(value: &str, assignment: &str) -> String {
    let path = parse_model(value);
    match path.key {
        None => format_compact!("{}={}", value, assignment),
        Some(key) => format_compact!("$set({}, {}, {})", path.exp, key, assignment),
    }
}
