//! Template AST node types.
//!
//! The tree is owned: every element holds its children directly, `v-if` heads
//! hold their `v-else-if`/`v-else` branches, and components hold their scoped
//! slot templates. Parent information is never stored on nodes; passes that need
//! it carry their own ancestor context.

use serde::Serialize;
use sinopia_carton::{bitflags, SmallVec, String};

/// Byte span `[start, end)` in the (trimmed) template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceRange {
    pub start: u32,
    pub end: u32,
}

impl SourceRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A range that only knows where it starts.
    pub const fn at(start: u32) -> Self {
        Self { start, end: start }
    }
}

bitflags! {
    /// Directive-processing state threaded through code generation.
    ///
    /// A structural directive that has already been expanded for the node being
    /// generated carries its bit, so re-entering element generation for the same
    /// node falls through to the next stage instead of expanding it again.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProcessFlags: u8 {
        const STATIC = 1 << 0;
        const ONCE = 1 << 1;
        const FOR = 1 << 2;
        const IF = 1 << 3;
    }
}

/// Placeholder slot scope used to force `v-slot` content into a scoped slot.
pub const EMPTY_SLOT_SCOPE: &str = "_empty_";

// ============================================================================
// Attributes, directives, handlers
// ============================================================================

/// An attribute as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttr {
    pub name: String,
    pub value: String,
    pub range: SourceRange,
}

/// A processed attribute or DOM property binding.
///
/// `value` is expression source: static attributes carry a quoted string
/// literal, bindings carry the bound expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
    pub dynamic: bool,
    pub range: Option<SourceRange>,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            dynamic: false,
            range: None,
        }
    }
}

/// Ordered, duplicate-free directive modifiers (`.stop.prevent`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Modifiers(SmallVec<[String; 2]>);

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str) {
        if !self.contains(name) {
            self.0.push(String::from(name));
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.0.iter().position(|m| m.as_str() == name) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|m| m.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|m| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for Modifiers {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut modifiers = Modifiers::new();
        for name in iter {
            modifiers.insert(name);
        }
        modifiers
    }
}

/// A custom or runtime directive (`v-focus:arg.mod="exp"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveNode {
    /// Name without the `v-` prefix.
    pub name: String,
    /// Attribute name as written.
    pub raw_name: String,
    pub value: String,
    pub arg: Option<String>,
    pub is_dynamic_arg: bool,
    pub modifiers: Option<Modifiers>,
    pub range: Option<SourceRange>,
}

/// One `v-on` listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handler {
    pub value: String,
    pub dynamic: bool,
    /// `Some` as soon as any modifier was written, even if every modifier was
    /// consumed while registering the handler.
    pub modifiers: Option<Modifiers>,
    pub range: Option<SourceRange>,
}

/// Event name to listeners, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventMap(Vec<(String, Vec<Handler>)>);

impl EventMap {
    pub fn add(&mut self, name: String, handler: Handler, important: bool) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, handlers)) if important => handlers.insert(0, handler),
            Some((_, handlers)) => handlers.push(handler),
            None => self.0.push((name, vec![handler])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Handler]> {
        self.0
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, h)| h.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Handler])> {
        self.0.iter().map(|(n, h)| (n.as_str(), h.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// ============================================================================
// Structural metadata
// ============================================================================

/// Parsed `v-for="(alias, iterator1, iterator2) in source"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForClause {
    pub source: String,
    pub alias: String,
    pub iterator1: Option<String>,
    pub iterator2: Option<String>,
}

impl ForClause {
    /// Function parameter list for the loop callback.
    pub fn params(&self) -> std::string::String {
        let mut params = std::string::String::from(self.alias.as_str());
        for iterator in [&self.iterator1, &self.iterator2].into_iter().flatten() {
            params.push(',');
            params.push_str(iterator);
        }
        params
    }
}

/// A `v-else-if` / `v-else` branch chained onto a `v-if` head.
///
/// The head itself is the element carrying [`ElementNode::if_exp`]; only the
/// following branches are stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct IfCondition {
    /// `None` for `v-else`.
    pub exp: Option<String>,
    pub block: ElementNode,
}

/// Slot name expression to slot template, in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopedSlots(Vec<(String, ElementNode)>);

impl ScopedSlots {
    /// Insert or replace; a replaced slot keeps its original position.
    pub fn insert(&mut self, name: String, el: ElementNode) {
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = el,
            None => self.0.push((name, el)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ElementNode> {
        self.0.iter().find(|(n, _)| n.as_str() == name).map(|(_, el)| el)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ElementNode)> {
        self.0.iter().map(|(n, el)| (n.as_str(), el))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut ElementNode> {
        self.0.iter_mut().map(|(_, el)| el)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

// ============================================================================
// Template Nodes
// ============================================================================

/// All template child node types
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Element(Box<ElementNode>),
    /// Text containing interpolations.
    Expression(ExpressionNode),
    /// Literal text.
    Text(TextNode),
    Comment(CommentNode),
}

impl TemplateNode {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Source text of text-like nodes.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Element(_) => None,
            Self::Expression(n) => Some(&n.text),
            Self::Text(n) => Some(&n.text),
            Self::Comment(n) => Some(&n.text),
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            Self::Element(el) => el.is_static,
            Self::Expression(_) => false,
            Self::Text(_) | Self::Comment(_) => true,
        }
    }

    pub fn range(&self) -> Option<SourceRange> {
        match self {
            Self::Element(el) => Some(el.range),
            Self::Expression(n) => n.range,
            Self::Text(n) => n.range,
            Self::Comment(n) => n.range,
        }
    }
}

/// A segment of interpolated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextToken {
    Literal(String),
    Binding(String),
}

/// Interpolated text (`Hello {{ name }}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionNode {
    /// Render expression: literal segments and `_s(..)` calls joined by `+`.
    pub expression: String,
    pub tokens: Vec<TextToken>,
    pub text: String,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub text: String,
    pub range: Option<SourceRange>,
}

/// Element node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementNode {
    pub tag: String,
    pub ns: Option<&'static str>,
    pub range: SourceRange,

    /// Every attribute as written, in source order.
    pub raw_attrs: Vec<RawAttr>,
    /// Attributes not yet consumed by a processing step.
    pub attrs_list: Vec<RawAttr>,
    /// Name to value lookup of the original attributes.
    pub attrs_map: sinopia_carton::FxHashMap<String, String>,
    pub children: Vec<TemplateNode>,

    pub plain: bool,
    pub has_bindings: bool,
    pub pre: bool,
    pub forbidden: bool,

    // structural directives
    pub for_clause: Option<ForClause>,
    pub if_exp: Option<String>,
    pub else_if: Option<String>,
    pub is_else: bool,
    pub if_conditions: Vec<IfCondition>,
    pub once: bool,

    // slots and components
    pub slot_name: Option<String>,
    pub slot_target: Option<String>,
    pub slot_target_dynamic: bool,
    pub slot_scope: Option<String>,
    pub scoped_slots: ScopedSlots,
    pub component: Option<String>,
    pub inline_template: bool,

    pub key: Option<String>,
    pub ref_: Option<String>,
    pub ref_in_for: bool,

    // bindings
    pub attrs: Vec<Attr>,
    pub dynamic_attrs: Vec<Attr>,
    pub props: Vec<Attr>,
    pub events: EventMap,
    pub native_events: EventMap,
    pub directives: Vec<DirectiveNode>,

    // web platform modules
    pub static_class: Option<String>,
    pub class_binding: Option<String>,
    pub static_style: Option<String>,
    pub style_binding: Option<String>,

    // optimizer output
    pub is_static: bool,
    pub static_root: bool,
    pub static_in_for: bool,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, attrs: Vec<RawAttr>) -> Self {
        let mut attrs_map = sinopia_carton::FxHashMap::default();
        for attr in &attrs {
            attrs_map.insert(attr.name.clone(), attr.value.clone());
        }
        Self {
            tag: tag.into(),
            raw_attrs: attrs.clone(),
            attrs_list: attrs,
            attrs_map,
            ..Default::default()
        }
    }

    /// Original value of an attribute, whether or not it was consumed.
    #[inline]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs_map.get(name).map(|v| v.as_str())
    }

    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs_map.contains_key(name)
    }

    /// Source range of the last attribute written with `name`.
    pub fn raw_attr_range(&self, name: &str) -> Option<SourceRange> {
        self.raw_attrs
            .iter()
            .rev()
            .find(|a| a.name.as_str() == name)
            .map(|a| a.range)
    }

    /// Remove `name` from the pending attribute list and return its value.
    ///
    /// The attribute stays visible through [`ElementNode::attr`].
    pub fn take_attr(&mut self, name: &str) -> Option<String> {
        let value = self.attrs_map.get(name).cloned()?;
        if let Some(index) = self.attrs_list.iter().position(|a| a.name.as_str() == name) {
            self.attrs_list.remove(index);
        }
        Some(value)
    }

    /// Remove the first pending attribute whose name satisfies `pred`.
    pub fn take_attr_by(&mut self, pred: impl Fn(&str) -> bool) -> Option<RawAttr> {
        let index = self.attrs_list.iter().position(|a| pred(&a.name))?;
        Some(self.attrs_list.remove(index))
    }

    pub fn add_attr(&mut self, attr: Attr) {
        if attr.dynamic {
            self.dynamic_attrs.push(attr);
        } else {
            self.attrs.push(attr);
        }
        self.plain = false;
    }

    pub fn add_prop(&mut self, prop: Attr) {
        self.props.push(prop);
        self.plain = false;
    }

    pub fn add_directive(&mut self, dir: DirectiveNode) {
        self.directives.push(dir);
        self.plain = false;
    }

    /// Iterate the element's own direct element children.
    pub fn element_children(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(TemplateNode::as_element)
    }

    /// Field names, in template-object terms, that this element carries beyond
    /// the structural base every element has.
    ///
    /// The optimizer only treats an element as static when every name listed
    /// here is on its allow-list.
    pub fn defined_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut mark = |present: bool, key: &'static str| {
            if present {
                keys.push(key);
            }
        };
        mark(self.ns.is_some(), "ns");
        mark(self.has_bindings, "hasBindings");
        mark(self.pre, "pre");
        mark(self.forbidden, "forbidden");
        mark(self.for_clause.is_some(), "for");
        mark(self.if_exp.is_some(), "if");
        mark(!self.if_conditions.is_empty(), "ifConditions");
        mark(self.else_if.is_some(), "elseif");
        mark(self.is_else, "else");
        mark(self.once, "once");
        mark(self.slot_name.is_some(), "slotName");
        mark(self.slot_target.is_some(), "slotTarget");
        mark(self.slot_scope.is_some(), "slotScope");
        mark(!self.scoped_slots.is_empty(), "scopedSlots");
        mark(self.component.is_some(), "component");
        mark(self.inline_template, "inlineTemplate");
        mark(self.key.is_some(), "key");
        mark(self.ref_.is_some(), "ref");
        mark(self.ref_in_for, "refInFor");
        mark(!self.attrs.is_empty(), "attrs");
        mark(!self.dynamic_attrs.is_empty(), "dynamicAttrs");
        mark(!self.props.is_empty(), "props");
        mark(!self.events.is_empty(), "events");
        mark(!self.native_events.is_empty(), "nativeEvents");
        mark(!self.directives.is_empty(), "directives");
        mark(self.static_class.is_some(), "staticClass");
        mark(self.class_binding.is_some(), "classBinding");
        mark(self.static_style.is_some(), "staticStyle");
        mark(self.style_binding.is_some(), "styleBinding");
        keys
    }
}
