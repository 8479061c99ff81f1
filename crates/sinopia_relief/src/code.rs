//! Render IR.
//!
//! Code generation builds a [`Code`] tree rather than concatenating source
//! text. The tree is what the runtime interprets; its [`Display`] impl prints
//! the conventional render-function source (`_c('div',{...},[...])`), which is
//! the string form handed back from `compile`.
//!
//! Template expressions stay opaque source ([`Code::Expr`]); everything the
//! generator itself decides on is typed.

use std::fmt::{self, Display, Write as _};

use sinopia_carton::{js_string, String};

/// Runtime helpers referenced by render code, by their short names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    /// `_c(tag, data?, children?, normalizationType?)`
    CreateElement,
    /// `_o(vnode, id, key)`
    MarkOnce,
    /// `_n(value)`
    ToNumber,
    /// `_s(value)`
    ToDisplayString,
    /// `_l(source, fn)`
    RenderList,
    /// `_t(name, fallback?, props?, bindObject?)`
    RenderSlot,
    /// `_q(a, b)`
    LooseEqual,
    /// `_i(list, value)`
    LooseIndexOf,
    /// `_m(index, isInFor?)`
    RenderStatic,
    /// `_f(name)`
    ResolveFilter,
    /// `_k(eventKeyCode, key, builtInKeyCode, eventKey, builtInKeyName)`
    CheckKeyCodes,
    /// `_b(data, tag, value, asProp?, isSync?)`
    BindObjectProps,
    /// `_v(text)`
    CreateText,
    /// `_e(text?)`
    CreateEmpty,
    /// `_u(slots, res?, hasDynamicKeys?, contentHashKey?)`
    ResolveScopedSlots,
    /// `_g(data, listeners)`
    BindObjectListeners,
    /// `_d(staticObject, [key, value, ...])`
    BindDynamicKeys,
    /// `_p(eventName, marker)`
    PrependModifier,
}

impl Helper {
    pub const ALL: [Helper; 18] = [
        Helper::CreateElement,
        Helper::MarkOnce,
        Helper::ToNumber,
        Helper::ToDisplayString,
        Helper::RenderList,
        Helper::RenderSlot,
        Helper::LooseEqual,
        Helper::LooseIndexOf,
        Helper::RenderStatic,
        Helper::ResolveFilter,
        Helper::CheckKeyCodes,
        Helper::BindObjectProps,
        Helper::CreateText,
        Helper::CreateEmpty,
        Helper::ResolveScopedSlots,
        Helper::BindObjectListeners,
        Helper::BindDynamicKeys,
        Helper::PrependModifier,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Helper::CreateElement => "_c",
            Helper::MarkOnce => "_o",
            Helper::ToNumber => "_n",
            Helper::ToDisplayString => "_s",
            Helper::RenderList => "_l",
            Helper::RenderSlot => "_t",
            Helper::LooseEqual => "_q",
            Helper::LooseIndexOf => "_i",
            Helper::RenderStatic => "_m",
            Helper::ResolveFilter => "_f",
            Helper::CheckKeyCodes => "_k",
            Helper::BindObjectProps => "_b",
            Helper::CreateText => "_v",
            Helper::CreateEmpty => "_e",
            Helper::ResolveScopedSlots => "_u",
            Helper::BindObjectListeners => "_g",
            Helper::BindDynamicKeys => "_d",
            Helper::PrependModifier => "_p",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.name() == name)
    }
}

/// Object property key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropKey {
    /// Printed bare: `attrs:`
    Ident(String),
    /// Printed in double quotes, unescaped: `"aria-label":`
    Quoted(String),
}

impl PropKey {
    pub fn as_str(&self) -> &str {
        match self {
            PropKey::Ident(k) | PropKey::Quoted(k) => k,
        }
    }
}

/// Render IR node.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    /// Template expression source, evaluated against the render scope.
    Expr(String),
    /// String literal.
    Str(String),
    /// Element tag literal, printed single-quoted.
    TagName(String),
    Int(i64),
    Bool(bool),
    Null,
    Undefined,
    /// `void 0`
    Void,
    Paren(Box<Code>),
    Call(Helper, Vec<Code>),
    Object(Vec<(PropKey, Code)>),
    Array(Vec<Code>),
    /// `(test)?consequent:alternate`
    Cond {
        test: String,
        consequent: Box<Code>,
        alternate: Box<Code>,
    },
    /// `function(params){return body}`
    Func { params: String, body: Box<Code> },
    Handler(Box<HandlerCode>),
    /// `function ($$v) {assignment}`: component `v-model` callback.
    ModelCallback(String),
    /// `function(){with(this){return body}}`
    RenderFn(Box<Code>),
}

impl Code {
    #[inline]
    pub fn expr(source: impl Into<String>) -> Self {
        Code::Expr(source.into())
    }

    #[inline]
    pub fn call(helper: Helper, args: Vec<Code>) -> Self {
        Code::Call(helper, args)
    }

    #[inline]
    pub fn paren(code: Code) -> Self {
        Code::Paren(Box::new(code))
    }

    pub fn func(params: impl Into<String>, body: Code) -> Self {
        Code::Func {
            params: params.into(),
            body: Box::new(body),
        }
    }

    pub fn cond(test: impl Into<String>, consequent: Code, alternate: Code) -> Self {
        Code::Cond {
            test: test.into(),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    /// Render the node as source text.
    pub fn to_source(&self) -> std::string::String {
        self.to_string()
    }
}

/// Print items separated by commas.
fn comma_list<T: Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Expr(source) => f.write_str(source),
            Code::Str(s) => f.write_str(&js_string(s)),
            Code::TagName(tag) => write!(f, "'{}'", tag),
            Code::Int(n) => write!(f, "{}", n),
            Code::Bool(b) => write!(f, "{}", b),
            Code::Null => f.write_str("null"),
            Code::Undefined => f.write_str("undefined"),
            Code::Void => f.write_str("void 0"),
            Code::Paren(inner) => write!(f, "({})", inner),
            Code::Call(helper, args) => {
                write!(f, "{}(", helper.name())?;
                comma_list(f, args)?;
                f.write_char(')')
            }
            Code::Object(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_char(',')?;
                    }
                    match key {
                        PropKey::Ident(k) => write!(f, "{}:{}", k, value)?,
                        PropKey::Quoted(k) => write!(f, "\"{}\":{}", k, value)?,
                    }
                }
                f.write_char('}')
            }
            Code::Array(items) => {
                f.write_char('[')?;
                comma_list(f, items)?;
                f.write_char(']')
            }
            Code::Cond {
                test,
                consequent,
                alternate,
            } => write!(f, "({})?{}:{}", test, consequent, alternate),
            Code::Func { params, body } => write!(f, "function({}){{return {}}}", params, body),
            Code::Handler(handler) => write!(f, "{}", handler),
            Code::ModelCallback(assignment) => write!(f, "function ($$v) {{{}}}", assignment),
            Code::RenderFn(body) => write!(f, "function(){{with(this){{return {}}}}}", body),
        }
    }
}

// ============================================================================
// Event handlers
// ============================================================================

/// Generated listener.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerCode {
    /// A method path or function expression used as the listener itself.
    Direct(String),
    /// `function($event){guards body}`
    Wrapped {
        guards: Vec<Guard>,
        body: HandlerBody,
    },
}

impl Display for HandlerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerCode::Direct(source) => f.write_str(source),
            HandlerCode::Wrapped { guards, body } => {
                f.write_str("function($event){")?;
                for guard in guards {
                    write!(f, "{}", guard)?;
                }
                write!(f, "{}}}", body)
            }
        }
    }
}

/// How the user's handler source is invoked inside a wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerBody {
    /// `onClick` - called with the listener's arguments.
    MethodPath(String),
    /// `e => go(e)` - called with the listener's arguments.
    FunctionExpr(String),
    /// `go(1)` - its value is returned.
    Invocation(String),
    /// `count++` - run as a statement.
    Statement(String),
}

impl HandlerBody {
    pub fn source(&self) -> &str {
        match self {
            HandlerBody::MethodPath(s)
            | HandlerBody::FunctionExpr(s)
            | HandlerBody::Invocation(s)
            | HandlerBody::Statement(s) => s,
        }
    }
}

impl Display for HandlerBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerBody::MethodPath(s) => write!(f, "return {}.apply(null, arguments)", s),
            HandlerBody::FunctionExpr(s) => write!(f, "return ({}).apply(null, arguments)", s),
            HandlerBody::Invocation(s) => write!(f, "return {}", s),
            HandlerBody::Statement(s) => f.write_str(s),
        }
    }
}

/// Modifier keys checked by `.ctrl`, `.shift`, `.alt`, `.meta` and `.exact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemKey {
    Ctrl,
    Shift,
    Alt,
    Meta,
}

impl SystemKey {
    pub const ALL: [SystemKey; 4] = [SystemKey::Ctrl, SystemKey::Shift, SystemKey::Alt, SystemKey::Meta];

    pub const fn name(self) -> &'static str {
        match self {
            SystemKey::Ctrl => "ctrl",
            SystemKey::Shift => "shift",
            SystemKey::Alt => "alt",
            SystemKey::Meta => "meta",
        }
    }

    /// Event property holding the key state (`ctrlKey`).
    pub const fn event_prop(self) -> &'static str {
        match self {
            SystemKey::Ctrl => "ctrlKey",
            SystemKey::Shift => "shiftKey",
            SystemKey::Alt => "altKey",
            SystemKey::Meta => "metaKey",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub const fn index(self) -> u8 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}

/// One key alias test inside a key filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    /// Numeric modifier (`.13`): compare `keyCode` directly.
    Code(u32),
    /// Named modifier resolved through `_k` with the built-in alias tables.
    Alias {
        key: String,
        codes: Vec<u32>,
        names: Vec<&'static str>,
    },
}

impl Display for KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFilter::Code(code) => write!(f, "$event.keyCode!=={}", code),
            KeyFilter::Alias { key, codes, names } => {
                write!(f, "_k($event.keyCode,{},", js_string(key))?;
                match codes.as_slice() {
                    [] => f.write_str("undefined")?,
                    [code] => write!(f, "{}", code)?,
                    many => {
                        f.write_char('[')?;
                        comma_list(f, many)?;
                        f.write_char(']')?;
                    }
                }
                f.write_str(",$event.key,")?;
                match names.as_slice() {
                    [] => f.write_str("undefined")?,
                    [name] => f.write_str(&js_string(name))?,
                    many => {
                        f.write_char('[')?;
                        for (i, name) in many.iter().enumerate() {
                            if i > 0 {
                                f.write_char(',')?;
                            }
                            f.write_str(&js_string(name))?;
                        }
                        f.write_char(']')?;
                    }
                }
                f.write_char(')')
            }
        }
    }
}

/// A statement run before the handler body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Only key events whose key matches every filter get through.
    KeyFilter(Vec<KeyFilter>),
    Stop,
    Prevent,
    SelfOnly,
    SystemKey(SystemKey),
    Button(MouseButton),
    /// Reject when any of these (unlisted) system keys is held.
    Exact(Vec<SystemKey>),
}

impl Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::KeyFilter(filters) => {
                f.write_str("if(!$event.type.indexOf('key')&&")?;
                for (i, filter) in filters.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&&")?;
                    }
                    write!(f, "{}", filter)?;
                }
                f.write_str(")return null;")
            }
            Guard::Stop => f.write_str("$event.stopPropagation();"),
            Guard::Prevent => f.write_str("$event.preventDefault();"),
            Guard::SelfOnly => f.write_str("if($event.target !== $event.currentTarget)return null;"),
            Guard::SystemKey(key) => write!(f, "if(!$event.{})return null;", key.event_prop()),
            Guard::Button(button) => write!(
                f,
                "if('button' in $event && $event.button !== {})return null;",
                button.index()
            ),
            Guard::Exact(keys) => {
                f.write_str("if(")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str("||")?;
                    }
                    write!(f, "$event.{}", key.event_prop())?;
                }
                f.write_str(")return null;")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_element_call() {
        let code = Code::call(
            Helper::CreateElement,
            vec![
                Code::TagName("div".into()),
                Code::Object(vec![(PropKey::Ident("attrs".into()), {
                    Code::Object(vec![(PropKey::Quoted("id".into()), Code::expr("\"app\""))])
                })]),
                Code::Array(vec![Code::call(
                    Helper::CreateText,
                    vec![Code::Str("hi".into())],
                )]),
            ],
        );
        insta::assert_snapshot!(code, @r#"_c('div',{attrs:{"id":"app"}},[_v("hi")])"#);
    }

    #[test]
    fn test_print_cond_and_func() {
        let code = Code::cond(
            "ok",
            Code::call(Helper::RenderList, vec![
                Code::paren(Code::expr("items")),
                Code::func("item", Code::expr("item")),
            ]),
            Code::call(Helper::CreateEmpty, vec![]),
        );
        assert_eq!(
            code.to_string(),
            "(ok)?_l((items),function(item){return item}):_e()"
        );
    }

    #[test]
    fn test_print_handler() {
        let handler = HandlerCode::Wrapped {
            guards: vec![
                Guard::KeyFilter(vec![KeyFilter::Alias {
                    key: "enter".into(),
                    codes: vec![13],
                    names: vec!["Enter"],
                }]),
                Guard::Prevent,
            ],
            body: HandlerBody::MethodPath("submit".into()),
        };
        insta::assert_snapshot!(
            handler,
            @r#"function($event){if(!$event.type.indexOf('key')&&_k($event.keyCode,"enter",13,$event.key,"Enter"))return null;$event.preventDefault();return submit.apply(null, arguments)}"#
        );
    }

    #[test]
    fn test_print_key_alias_tables() {
        let filter = KeyFilter::Alias {
            key: "delete".into(),
            codes: vec![8, 46],
            names: vec!["Backspace", "Delete", "Del"],
        };
        assert_eq!(
            filter.to_string(),
            r#"_k($event.keyCode,"delete",[8,46],$event.key,["Backspace","Delete","Del"])"#
        );
        let unknown = KeyFilter::Alias {
            key: "f1".into(),
            codes: vec![],
            names: vec![],
        };
        assert_eq!(
            unknown.to_string(),
            r#"_k($event.keyCode,"f1",undefined,$event.key,undefined)"#
        );
    }

    #[test]
    fn test_helper_names_round_trip() {
        for helper in Helper::ALL {
            assert_eq!(Helper::from_name(helper.name()), Some(helper));
        }
        assert_eq!(Helper::from_name("_z"), None);
    }
}
