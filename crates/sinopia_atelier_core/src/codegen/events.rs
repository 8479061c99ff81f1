//! Listener generation (`on:{...}` / `nativeOn:{...}`).

use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_carton::String;
use sinopia_relief::{
    Code, EventMap, Guard, Handler, HandlerBody, HandlerCode, KeyFilter, MouseButton, PropKey,
    SystemKey,
};

static FN_EXP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_$]+|\([^)]*?\))\s*=>|^function(?:\s+[A-Za-z0-9_$]+)?\s*\(").unwrap()
});
static FN_INVOKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*?\);*$").unwrap());
static SIMPLE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*|\['[^']*?'\]|\["[^"]*?"\]|\[\d+\]|\[[A-Za-z_$][A-Za-z0-9_$]*\])*$"#,
    )
    .unwrap()
});

/// Listener map as an object literal; a single listener on a dynamic event
/// name moves the entry into `_d(...)`.
pub fn gen_handlers(events: &EventMap) -> Code {
    let mut static_handlers = Vec::with_capacity(events.len());
    let mut dynamic_handlers = Vec::new();
    for (name, handlers) in events.iter() {
        let code = gen_handler(handlers);
        match handlers {
            [handler] if handler.dynamic => {
                dynamic_handlers.push(Code::expr(name));
                dynamic_handlers.push(code);
            }
            _ => static_handlers.push((PropKey::Quoted(name.into()), code)),
        }
    }
    let static_handlers = Code::Object(static_handlers);
    if dynamic_handlers.is_empty() {
        static_handlers
    } else {
        Code::call(
            sinopia_relief::Helper::BindDynamicKeys,
            vec![static_handlers, Code::Array(dynamic_handlers)],
        )
    }
}

/// Listeners registered for one event; several become an array.
pub fn gen_handler(handlers: &[Handler]) -> Code {
    match handlers {
        [] => Code::Handler(Box::new(HandlerCode::Wrapped {
            guards: Vec::new(),
            body: HandlerBody::Statement(String::default()),
        })),
        [handler] => Code::Handler(Box::new(handler_code(handler))),
        many => Code::Array(
            many.iter()
                .map(|handler| Code::Handler(Box::new(handler_code(handler))))
                .collect(),
        ),
    }
}

fn handler_code(handler: &Handler) -> HandlerCode {
    let value = handler.value.as_str();
    let is_method_path = SIMPLE_PATH_RE.is_match(value);
    let is_function_expression = FN_EXP_RE.is_match(value);
    let is_function_invocation = SIMPLE_PATH_RE.is_match(&FN_INVOKE_RE.replace(value, ""));

    let Some(modifiers) = &handler.modifiers else {
        if is_method_path || is_function_expression {
            return HandlerCode::Direct(handler.value.clone());
        }
        let body = if is_function_invocation {
            HandlerBody::Invocation(handler.value.clone())
        } else {
            HandlerBody::Statement(handler.value.clone())
        };
        return HandlerCode::Wrapped {
            guards: Vec::new(),
            body,
        };
    };

    let mut guards = Vec::new();
    let mut keys = Vec::new();
    for modifier in modifiers.iter() {
        match modifier {
            "stop" => guards.push(Guard::Stop),
            "prevent" => guards.push(Guard::Prevent),
            "self" => guards.push(Guard::SelfOnly),
            "ctrl" => guards.push(Guard::SystemKey(SystemKey::Ctrl)),
            "shift" => guards.push(Guard::SystemKey(SystemKey::Shift)),
            "alt" => guards.push(Guard::SystemKey(SystemKey::Alt)),
            "meta" => guards.push(Guard::SystemKey(SystemKey::Meta)),
            // left/right are arrow keys as well as mouse buttons
            "left" => {
                guards.push(Guard::Button(MouseButton::Left));
                keys.push(modifier);
            }
            "right" => {
                guards.push(Guard::Button(MouseButton::Right));
                keys.push(modifier);
            }
            "middle" => guards.push(Guard::Button(MouseButton::Middle)),
            "exact" => guards.push(Guard::Exact(
                SystemKey::ALL
                    .into_iter()
                    .filter(|key| !modifiers.contains(key.name()))
                    .collect(),
            )),
            _ => keys.push(modifier),
        }
    }
    if !keys.is_empty() {
        guards.insert(0, Guard::KeyFilter(keys.into_iter().map(key_filter).collect()));
    }

    let body = if is_method_path {
        HandlerBody::MethodPath(handler.value.clone())
    } else if is_function_expression {
        HandlerBody::FunctionExpr(handler.value.clone())
    } else if is_function_invocation {
        HandlerBody::Invocation(handler.value.clone())
    } else {
        HandlerBody::Statement(handler.value.clone())
    };
    HandlerCode::Wrapped { guards, body }
}

/// `.13` compares the key code directly; names go through the alias tables.
fn key_filter(key: &str) -> KeyFilter {
    let digits_end = key
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(key.len());
    if let Ok(code) = key[..digits_end].parse::<u32>() {
        if code != 0 {
            return KeyFilter::Code(code);
        }
    }
    let (codes, names) = KEY_ALIASES
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|&(_, codes, names)| (codes.to_vec(), names.to_vec()))
        .unwrap_or_default();
    KeyFilter::Alias {
        key: key.into(),
        codes,
        names,
    }
}

/// Key modifier aliases: `keyCode` values and `KeyboardEvent.key` names.
const KEY_ALIASES: &[(&str, &[u32], &[&str])] = &[
    ("esc", &[27], &["Esc", "Escape"]),
    ("tab", &[9], &["Tab"]),
    ("enter", &[13], &["Enter"]),
    ("space", &[32], &[" ", "Spacebar"]),
    ("up", &[38], &["Up", "ArrowUp"]),
    ("left", &[37], &["Left", "ArrowLeft"]),
    ("right", &[39], &["Right", "ArrowRight"]),
    ("down", &[40], &["Down", "ArrowDown"]),
    ("delete", &[8, 46], &["Backspace", "Delete", "Del"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_relief::Modifiers;

    fn handler(value: &str, modifiers: Option<&[&str]>) -> Handler {
        Handler {
            value: value.into(),
            dynamic: false,
            modifiers: modifiers.map(|m| m.iter().copied().collect::<Modifiers>()),
            range: None,
        }
    }

    fn code(value: &str, modifiers: Option<&[&str]>) -> std::string::String {
        gen_handler(&[handler(value, modifiers)]).to_string()
    }

    #[test]
    fn test_method_path_and_function_expression_direct() {
        assert_eq!(code("onClick", None), "onClick");
        assert_eq!(code("a.b['c'][0]", None), "a.b['c'][0]");
        assert_eq!(code("e => go(e)", None), "e => go(e)");
        assert_eq!(code("function (e) { go(e) }", None), "function (e) { go(e) }");
    }

    #[test]
    fn test_inline_statements() {
        assert_eq!(code("go(1)", None), "function($event){return go(1)}");
        assert_eq!(code("count++", None), "function($event){count++}");
    }

    #[test]
    fn test_modifier_guards() {
        assert_eq!(
            code("go", Some(&["stop", "prevent"])),
            "function($event){$event.stopPropagation();$event.preventDefault();return go.apply(null, arguments)}"
        );
        assert_eq!(
            code("go()", Some(&["self"])),
            "function($event){if($event.target !== $event.currentTarget)return null;return go()}"
        );
    }

    #[test]
    fn test_key_modifiers() {
        assert_eq!(
            code("submit", Some(&["enter", "ctrl"])),
            "function($event){if(!$event.type.indexOf('key')&&_k($event.keyCode,\"enter\",13,$event.key,\"Enter\"))return null;if(!$event.ctrlKey)return null;return submit.apply(null, arguments)}"
        );
        assert_eq!(
            code("go", Some(&["13"])),
            "function($event){if(!$event.type.indexOf('key')&&$event.keyCode!==13)return null;return go.apply(null, arguments)}"
        );
    }

    #[test]
    fn test_left_is_button_and_key() {
        assert_eq!(
            code("go", Some(&["left"])),
            "function($event){if(!$event.type.indexOf('key')&&_k($event.keyCode,\"left\",37,$event.key,[\"Left\",\"ArrowLeft\"]))return null;if('button' in $event && $event.button !== 0)return null;return go.apply(null, arguments)}"
        );
    }

    #[test]
    fn test_exact() {
        assert_eq!(
            code("go", Some(&["ctrl", "exact"])),
            "function($event){if(!$event.ctrlKey)return null;if($event.shiftKey||$event.altKey||$event.metaKey)return null;return go.apply(null, arguments)}"
        );
    }

    #[test]
    fn test_consumed_modifiers_still_wrap() {
        assert_eq!(
            code("go", Some(&[])),
            "function($event){return go.apply(null, arguments)}"
        );
    }

    #[test]
    fn test_multiple_handlers_and_dynamic_names() {
        let mut events = EventMap::default();
        events.add("click".into(), handler("a", None), false);
        events.add("click".into(), handler("b", None), false);
        let mut dynamic = handler("c", None);
        dynamic.dynamic = true;
        events.add("evt".into(), dynamic, false);
        assert_eq!(
            gen_handlers(&events).to_string(),
            "_d({\"click\":[a,b]},[evt,c])"
        );
    }
}
