//! Virtual nodes produced by render code.

use std::fmt;

use sinopia_atelier_dom::parse_style_text;
use sinopia_carton::{format_compact, hyphenate, is_unary_tag, String};
use sinopia_relief::Code;
use sinopia_tempera::{ReactiveObject, Value};

use crate::builtins::call;
use crate::env::Env;
use crate::error::EvalResult;

/// A scoped slot compiled into the parent's render code (`_u`).
#[derive(Clone)]
pub struct CompiledSlot {
    pub key: String,
    /// Parameter list source, e.g. `{ item }`.
    pub params: String,
    pub body: Code,
    pub env: Env,
    /// Also exposed as a normal slot.
    pub proxy: bool,
}

impl fmt::Debug for CompiledSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSlot")
            .field("key", &self.key)
            .field("params", &self.params)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// Element data: the evaluated data object plus compiled scoped slots.
#[derive(Debug, Clone, Default)]
pub struct VNodeData {
    pub fields: ReactiveObject,
    pub scoped_slots: Vec<CompiledSlot>,
}

impl VNodeData {
    pub fn new(fields: ReactiveObject) -> Self {
        Self {
            fields,
            scoped_slots: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Value {
        self.fields.get(key)
    }

    fn entries(&self, key: &str) -> Vec<(String, Value)> {
        match self.get(key) {
            Value::Object(obj) => obj.snapshot(),
            _ => Vec::new(),
        }
    }

    pub fn attrs(&self) -> Vec<(String, Value)> {
        self.entries("attrs")
    }

    pub fn dom_props(&self) -> Vec<(String, Value)> {
        self.entries("domProps")
    }

    /// Listeners by event name.
    pub fn on(&self) -> Vec<(String, Value)> {
        self.entries("on")
    }

    /// Static and bound classes as one class string.
    pub fn class(&self) -> String {
        let mut out = match self.get("staticClass") {
            Value::String(s) => s,
            _ => String::default(),
        };
        let dynamic = stringify_class(&self.get("class"));
        if !dynamic.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&dynamic);
        }
        out
    }

    /// Static and bound declarations; bound ones win.
    pub fn style(&self) -> Vec<(String, String)> {
        let mut declarations = Vec::new();
        merge_style(&mut declarations, &self.get("staticStyle"));
        merge_style(&mut declarations, &self.get("style"));
        declarations
    }

    pub fn scoped_slot(&self, name: &str) -> Option<&CompiledSlot> {
        self.scoped_slots.iter().find(|slot| slot.key == name)
    }
}

/// Class binding value to a class string: strings as is, arrays joined,
/// objects by truthy keys.
pub fn stringify_class(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            let mut out = String::default();
            for item in arr.to_vec() {
                let class = stringify_class(&item);
                if class.is_empty() {
                    continue;
                }
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&class);
            }
            out
        }
        Value::Object(obj) => {
            let mut out = String::default();
            for (key, value) in obj.snapshot() {
                if !value.is_truthy() {
                    continue;
                }
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&key);
            }
            out
        }
        _ => String::default(),
    }
}

fn put_declaration(declarations: &mut Vec<(String, String)>, property: String, value: String) {
    match declarations.iter_mut().find(|(p, _)| *p == property) {
        Some(existing) => existing.1 = value,
        None => declarations.push((property, value)),
    }
}

fn merge_style(declarations: &mut Vec<(String, String)>, value: &Value) {
    match value {
        Value::String(text) => {
            for (property, value) in parse_style_text(text) {
                put_declaration(declarations, property, value);
            }
        }
        Value::Array(arr) => {
            for item in arr.to_vec() {
                merge_style(declarations, &item);
            }
        }
        Value::Object(obj) => {
            for (property, value) in obj.snapshot() {
                if value.is_nullish() || value == Value::Bool(false) {
                    continue;
                }
                let property = if property.starts_with("--") {
                    property
                } else {
                    String::from(hyphenate(&property))
                };
                put_declaration(declarations, property, format_compact!("{}", value));
            }
        }
        _ => {}
    }
}

/// A virtual DOM node.
#[derive(Debug, Clone, Default)]
pub struct VNode {
    /// `None` for text and comment nodes.
    pub tag: Option<String>,
    pub data: Option<VNodeData>,
    pub children: Vec<VNode>,
    pub text: Option<String>,
    pub key: Option<Value>,
    pub is_comment: bool,
    /// Hoisted by the optimizer and rendered once.
    pub is_static: bool,
    /// Rendered once because of `v-once`.
    pub is_once: bool,
}

impl VNode {
    pub fn element(tag: impl Into<String>, data: Option<VNodeData>, children: Vec<VNode>) -> Self {
        let key = data
            .as_ref()
            .map(|data| data.get("key"))
            .filter(|key| !matches!(key, Value::Undefined));
        Self {
            tag: Some(tag.into()),
            data,
            children,
            key,
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// The placeholder `_e()` renders for a missing branch.
    pub fn empty(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_comment: true,
            ..Default::default()
        }
    }

    pub fn is_element(&self) -> bool {
        self.tag.is_some()
    }

    /// An empty comment node, as rendered for a false `v-if` without `v-else`.
    pub fn is_empty(&self) -> bool {
        self.is_comment && self.text.as_deref().map_or(true, str::is_empty)
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn class(&self) -> String {
        self.data.as_ref().map(VNodeData::class).unwrap_or_default()
    }

    pub fn attr(&self, name: &str) -> Option<Value> {
        self.data.as_ref().and_then(|data| {
            data.attrs()
                .into_iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value)
        })
    }

    pub fn dom_prop(&self, name: &str) -> Option<Value> {
        self.data.as_ref().and_then(|data| {
            data.dom_props()
                .into_iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value)
        })
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> std::string::String {
        let mut out = std::string::String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut std::string::String) {
        if self.is_comment {
            return;
        }
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Depth-first search for the first element with `tag`.
    pub fn find(&self, tag: &str) -> Option<&VNode> {
        if self.tag() == Some(tag) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(tag))
    }

    /// Every element with `tag`, in document order.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a VNode>) {
        if self.tag() == Some(tag) {
            out.push(self);
        }
        for child in &self.children {
            child.find_all(tag, out);
        }
    }

    /// Invoke the listeners bound for `event` with `args`.
    pub fn emit(&self, event: &str, args: &[Value]) -> EvalResult<()> {
        let Some(data) = &self.data else {
            return Ok(());
        };
        let handlers = match data.on().into_iter().find(|(name, _)| name == event) {
            Some((_, Value::Array(list))) => list.to_vec(),
            Some((_, handler)) => vec![handler],
            None => return Ok(()),
        };
        for handler in handlers {
            call(&handler, args, event)?;
        }
        Ok(())
    }

    /// A JSON view of the tree: tag, key, class, style, attrs, domProps,
    /// listener names and children. Empty fields are left out.
    pub fn to_json(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        if self.is_comment {
            out.insert("comment".into(), self.text.as_deref().unwrap_or_default().into());
            return serde_json::Value::Object(out);
        }
        let Some(tag) = &self.tag else {
            out.insert("text".into(), self.text.as_deref().unwrap_or_default().into());
            return serde_json::Value::Object(out);
        };
        out.insert("tag".into(), tag.as_str().into());
        if let Some(key) = &self.key {
            out.insert("key".into(), key.to_json());
        }
        if self.is_static {
            out.insert("static".into(), true.into());
        }
        if let Some(data) = &self.data {
            let class = data.class();
            if !class.is_empty() {
                out.insert("class".into(), class.as_str().into());
            }
            let style = data.style();
            if !style.is_empty() {
                let style = style
                    .into_iter()
                    .map(|(property, value)| (property.to_string(), value.as_str().into()))
                    .collect();
                out.insert("style".into(), serde_json::Value::Object(style));
            }
            for (field, pairs) in [("attrs", data.attrs()), ("domProps", data.dom_props())] {
                if !pairs.is_empty() {
                    let pairs = pairs
                        .into_iter()
                        .map(|(key, value)| (key.to_string(), value.to_json()))
                        .collect();
                    out.insert(field.into(), serde_json::Value::Object(pairs));
                }
            }
            let on = data.on();
            if !on.is_empty() {
                let names = on.into_iter().map(|(name, _)| name.as_str().into()).collect();
                out.insert("on".into(), serde_json::Value::Array(names));
            }
        }
        if !self.children.is_empty() {
            let children = self.children.iter().map(VNode::to_json).collect();
            out.insert("children".into(), serde_json::Value::Array(children));
        }
        serde_json::Value::Object(out)
    }

    /// Serialize to HTML.
    pub fn to_html(&self) -> std::string::String {
        let mut out = std::string::String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut std::string::String) {
        let Some(tag) = &self.tag else {
            match &self.text {
                Some(text) if self.is_comment => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Some(text) => out.push_str(&html_escape::encode_text(text)),
                None => {}
            }
            return;
        };
        out.push('<');
        out.push_str(tag);
        let mut inner: Option<std::string::String> = None;
        if let Some(data) = &self.data {
            let class = data.class();
            if !class.is_empty() {
                write_attr(out, "class", &class);
            }
            let style = data.style();
            if !style.is_empty() {
                let text: std::string::String = style
                    .iter()
                    .map(|(property, value)| format!("{}:{};", property, value))
                    .collect();
                write_attr(out, "style", &text);
            }
            for (name, value) in data.attrs() {
                match value {
                    Value::Undefined | Value::Null | Value::Bool(false) => {}
                    Value::Bool(true) => {
                        out.push(' ');
                        out.push_str(&name);
                    }
                    other => write_attr(out, &name, &other.to_string()),
                }
            }
            for (name, value) in data.dom_props() {
                match name.as_str() {
                    "textContent" => inner = Some(html_escape::encode_text(&value.to_string()).into_owned()),
                    "innerHTML" => inner = Some(value.to_string()),
                    "value" if !value.is_nullish() => write_attr(out, "value", &value.to_string()),
                    "checked" | "selected" | "disabled" if value.is_truthy() => {
                        out.push(' ');
                        out.push_str(&name);
                    }
                    _ => {}
                }
            }
        }
        out.push('>');
        if is_unary_tag(tag) {
            return;
        }
        match inner {
            Some(inner) => out.push_str(&inner),
            None => {
                for child in &self.children {
                    child.write_html(out);
                }
            }
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn write_attr(out: &mut std::string::String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}

impl fmt::Display for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}
