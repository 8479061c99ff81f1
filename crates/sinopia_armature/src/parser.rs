//! Template tree builder.
//!
//! Drives the HTML scanner and turns its events into [`ElementNode`]s:
//! structural directives are read when an element opens, everything else
//! (key, ref, slots, component, module transforms, bindings) when it closes.

use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_carton::{camelize, format_compact, hyphenate, js_string, String};
use sinopia_relief::{
    Attr, CommentNode, CompilerOptions, Diagnostics, DirectiveNode, ElementNode, ExpressionNode,
    ForClause, IfCondition, RawAttr, SourceRange, TemplateNode, TextNode, WhitespaceStrategy,
    EMPTY_SLOT_SCOPE,
};

use crate::filter_parser::parse_filters;
use crate::helpers::{
    add_handler, gen_assignment_code, get_binding_attr, parse_modifiers, raw_binding_attr_range,
    strip_modifiers,
};
use crate::html_parser::{parse_html, HtmlHandler, ScanOptions};
use crate::text_parser::parse_text;

static FOR_ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\s\S]*?)\s+(?:in|of)\s+([\s\S]*)").unwrap());
static FOR_ITERATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",([^,\}\]]*)(?:,([^,\}\]]*))?$").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \f\t\r\n]+").unwrap());
static INVALID_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\s"'<>/=]"#).unwrap());

// ============================================================================
// Attribute name classification
// ============================================================================

#[inline]
fn is_directive(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with('@') || name.starts_with(':') || name.starts_with('#')
}

fn strip_bind_prefix(name: &str) -> Option<&str> {
    name.strip_prefix(':')
        .or_else(|| name.strip_prefix("v-bind:"))
}

fn strip_on_prefix(name: &str) -> Option<&str> {
    name.strip_prefix('@').or_else(|| name.strip_prefix("v-on:"))
}

fn strip_directive_prefix(name: &str) -> &str {
    name.strip_prefix("v-")
        .or_else(|| name.strip_prefix('@'))
        .or_else(|| name.strip_prefix(':'))
        .or_else(|| name.strip_prefix('#'))
        .unwrap_or(name)
}

#[inline]
fn is_dynamic_arg(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('[') && name.ends_with(']')
}

/// `v-slot`, `v-slot:name` or `#name`.
fn is_slot_attr(name: &str) -> bool {
    name == "v-slot" || name.starts_with("v-slot:") || name.starts_with('#')
}

fn strip_slot_prefix(name: &str) -> &str {
    name.strip_prefix("v-slot:")
        .or_else(|| name.strip_prefix("v-slot"))
        .or_else(|| name.strip_prefix('#'))
        .unwrap_or(name)
}

/// Parse the value of `v-for`.
pub fn parse_for(exp: &str) -> Option<ForClause> {
    let caps = FOR_ALIAS.captures(exp)?;
    let source = caps.get(2)?.as_str().trim();
    let alias = caps.get(1)?.as_str().trim();
    let alias = alias.strip_prefix('(').unwrap_or(alias);
    let alias = alias.strip_suffix(')').unwrap_or(alias);

    let mut clause = ForClause {
        source: source.into(),
        alias: alias.into(),
        iterator1: None,
        iterator2: None,
    };
    if let Some(iterators) = FOR_ITERATOR.captures(alias) {
        clause.alias = FOR_ITERATOR.replace(alias, "").trim().into();
        clause.iterator1 = iterators.get(1).map(|m| m.as_str().trim().into());
        clause.iterator2 = iterators
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(String::from);
    }
    Some(clause)
}

// ============================================================================
// Tree builder
// ============================================================================

/// What an element being closed knows about its ancestors.
struct ParentContext {
    tag: Option<String>,
    maybe_component: Option<bool>,
    in_for: bool,
    aliases: Vec<String>,
}

struct TreeBuilder<'a> {
    template: &'a str,
    options: &'a CompilerOptions,
    diag: &'a mut Diagnostics,
    stack: Vec<ElementNode>,
    root: Option<ElementNode>,
    has_root: bool,
    in_v_pre: bool,
    in_pre: bool,
}

/// Parse a template into its root element.
///
/// Problems are reported to `diag`; the result is best effort and `None`
/// only when the template has no element at all.
pub fn parse(
    template: &str,
    options: &CompilerOptions,
    diag: &mut Diagnostics,
) -> Option<ElementNode> {
    let scan = ScanOptions {
        expect_html: options.expect_html,
        should_keep_comment: options.comments,
        should_decode_newlines: options.should_decode_newlines,
        should_decode_newlines_for_href: options.should_decode_newlines_for_href,
        is_unary_tag: options.is_unary_tag,
        can_be_left_open_tag: options.can_be_left_open_tag,
        ..ScanOptions::default()
    };
    let mut builder = TreeBuilder {
        template,
        options,
        diag,
        stack: Vec::new(),
        root: None,
        has_root: false,
        in_v_pre: false,
        in_pre: false,
    };
    parse_html(template, scan, &mut builder);
    tracing::debug!(
        root = builder.root.as_ref().map(|r| r.tag.as_str()),
        "template parsed"
    );
    builder.root
}

impl HtmlHandler for TreeBuilder<'_> {
    fn start(&mut self, tag: &str, attrs: Vec<RawAttr>, unary: bool, start: u32, end: u32) {
        let ns = self
            .stack
            .last()
            .and_then(|parent| parent.ns)
            .or_else(|| (self.options.get_tag_namespace)(tag));

        for (i, attr) in attrs.iter().enumerate() {
            if INVALID_ATTRIBUTE.is_match(&attr.name) {
                let bracket = attr.name.find('[').unwrap_or(0) as u32;
                self.diag.warn(
                    "Invalid dynamic argument expression: attribute names cannot contain spaces, quotes, <, >, / or =.",
                    Some(SourceRange::new(
                        attr.range.start + bracket,
                        attr.range.start + attr.name.len() as u32,
                    )),
                );
            }
            let earlier = attrs[..i].iter().rev().find(|a| a.name == attr.name);
            if earlier.is_some_and(|a| !a.value.is_empty()) {
                self.diag
                    .warn(format!("duplicate attribute: {}", attr.name), Some(attr.range));
            }
        }

        let mut element = ElementNode::new(tag, attrs);
        element.ns = ns;
        element.range = SourceRange::new(start, end);

        if is_forbidden_tag(&element) {
            element.forbidden = true;
            self.diag.warn(
                format!(
                    "Templates should only be responsible for mapping the state to the UI. Avoid placing tags with side-effects in your templates, such as <{}>, as they will not be parsed.",
                    tag
                ),
                Some(SourceRange::at(start)),
            );
        }

        if !self.in_v_pre {
            if element.take_attr("v-pre").is_some() {
                element.pre = true;
            }
            if element.pre {
                self.in_v_pre = true;
            }
        }
        if (self.options.is_pre_tag)(&element.tag) {
            self.in_pre = true;
        }
        if self.in_v_pre {
            self.process_raw_attrs(&mut element);
        } else {
            self.process_for(&mut element);
            process_if(&mut element);
            if element.take_attr("v-once").is_some() {
                element.once = true;
            }
        }

        if !self.has_root {
            self.has_root = true;
            self.check_root_constraints(&element);
        }

        if unary {
            self.close_element(element);
        } else {
            self.stack.push(element);
        }
    }

    fn end(&mut self, _tag: &str, _start: u32, end: u32) {
        if let Some(mut element) = self.stack.pop() {
            element.range.end = end;
            self.close_element(element);
        }
    }

    fn chars(&mut self, text: &str, range: Option<SourceRange>) {
        let Some(parent) = self.stack.last_mut() else {
            if text == self.template {
                self.diag.warn_once(
                    "Component template requires a root element, rather than just text.",
                    range,
                );
            } else {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.diag.warn_once(
                        format!("text \"{}\" outside root element will be ignored.", trimmed),
                        range,
                    );
                }
            }
            return;
        };

        let whitespace = self.options.whitespace;
        let mut text: std::string::String = if self.in_pre || !text.trim().is_empty() {
            if is_text_tag(&parent.tag) {
                text.to_owned()
            } else {
                html_escape::decode_html_entities(text).into_owned()
            }
        } else if parent.children.is_empty() {
            // whitespace right after an opening tag
            std::string::String::new()
        } else {
            match whitespace {
                Some(WhitespaceStrategy::Condense) if text.contains(['\r', '\n']) => {
                    std::string::String::new()
                }
                Some(_) => " ".to_owned(),
                None if self.options.preserve_whitespace => " ".to_owned(),
                None => std::string::String::new(),
            }
        };
        if text.is_empty() {
            return;
        }
        if !self.in_pre && whitespace == Some(WhitespaceStrategy::Condense) {
            text = WHITESPACE.replace_all(&text, " ").into_owned();
        }

        let range = if self.options.output_source_range {
            range
        } else {
            None
        };
        let parsed = if !self.in_v_pre && text != " " {
            parse_text(&text, self.options.delimiters.as_ref())
        } else {
            None
        };
        let child = match parsed {
            Some(parsed) => Some(TemplateNode::Expression(ExpressionNode {
                expression: parsed.expression,
                tokens: parsed.tokens,
                text: text.into(),
                range,
            })),
            None => {
                let last_is_space = parent
                    .children
                    .last()
                    .and_then(TemplateNode::text)
                    .is_some_and(|t| t == " ");
                if text != " " || parent.children.is_empty() || !last_is_space {
                    Some(TemplateNode::Text(TextNode {
                        text: text.into(),
                        range,
                    }))
                } else {
                    None
                }
            }
        };
        if let Some(child) = child {
            parent.children.push(child);
        }
    }

    fn comment(&mut self, text: &str, start: u32, end: u32) {
        // comments beside the root are dropped
        if let Some(parent) = self.stack.last_mut() {
            let range = self
                .options
                .output_source_range
                .then_some(SourceRange::new(start, end));
            parent.children.push(TemplateNode::Comment(CommentNode {
                text: text.into(),
                range,
            }));
        }
    }

    fn warn(&mut self, msg: std::string::String, range: Option<SourceRange>) {
        self.diag.warn(msg, range);
    }
}

fn is_text_tag(tag: &str) -> bool {
    tag == "script" || tag == "style"
}

fn is_forbidden_tag(el: &ElementNode) -> bool {
    el.tag.as_str() == "style"
        || (el.tag.as_str() == "script"
            && el
                .attr("type")
                .map_or(true, |t| t.is_empty() || t == "text/javascript"))
}

fn process_if(el: &mut ElementNode) {
    match el.take_attr("v-if") {
        Some(exp) if !exp.is_empty() => el.if_exp = Some(exp),
        _ => {
            if el.take_attr("v-else").is_some() {
                el.is_else = true;
            }
            if let Some(exp) = el.take_attr("v-else-if").filter(|e| !e.is_empty()) {
                el.else_if = Some(exp);
            }
        }
    }
}

impl TreeBuilder<'_> {
    fn keep_range(&self, range: SourceRange) -> Option<SourceRange> {
        self.options.output_source_range.then_some(range)
    }

    fn check_root_constraints(&mut self, el: &ElementNode) {
        if el.tag.as_str() == "slot" || el.tag.as_str() == "template" {
            self.diag.warn_once(
                format!(
                    "Cannot use <{}> as component root element because it may contain multiple nodes.",
                    el.tag
                ),
                Some(SourceRange::at(el.range.start)),
            );
        }
        if el.has_attr("v-for") {
            self.diag.warn_once(
                "Cannot use v-for on stateful component root element because it renders multiple elements.",
                el.raw_attr_range("v-for"),
            );
        }
    }

    fn process_raw_attrs(&self, el: &mut ElementNode) {
        if el.attrs_list.is_empty() {
            if !el.pre {
                // non-root node in a v-pre block without attributes
                el.plain = true;
            }
            return;
        }
        el.attrs = el
            .attrs_list
            .iter()
            .map(|raw| Attr {
                name: raw.name.clone(),
                value: js_string(&raw.value).into(),
                dynamic: false,
                range: self.keep_range(raw.range),
            })
            .collect();
    }

    fn process_for(&mut self, el: &mut ElementNode) {
        let Some(exp) = el.take_attr("v-for").filter(|e| !e.is_empty()) else {
            return;
        };
        match parse_for(&exp) {
            Some(clause) => el.for_clause = Some(clause),
            None => self.diag.warn(
                format!("Invalid v-for expression: {}", exp),
                el.raw_attr_range("v-for"),
            ),
        }
    }

    fn trim_ending_whitespace(&self, el: &mut ElementNode) {
        if self.in_pre {
            return;
        }
        while matches!(el.children.last(), Some(TemplateNode::Text(t)) if t.text == " ") {
            el.children.pop();
        }
    }

    fn close_element(&mut self, mut element: ElementNode) {
        self.trim_ending_whitespace(&mut element);

        // slot-scoped children live in scoped_slots from here on
        if element.children.iter().any(is_scoped_slot) {
            let children = std::mem::take(&mut element.children);
            for child in children {
                match child {
                    TemplateNode::Element(slot) if slot.slot_scope.is_some() => {
                        let name = slot
                            .slot_target
                            .clone()
                            .unwrap_or_else(|| String::from("\"default\""));
                        element.scoped_slots.insert(name, *slot);
                    }
                    other => element.children.push(other),
                }
            }
        }

        if !self.in_v_pre {
            self.process_element(&mut element);
        }

        self.trim_ending_whitespace(&mut element);
        if element.pre {
            self.in_v_pre = false;
        }
        if (self.options.is_pre_tag)(&element.tag) {
            self.in_pre = false;
        }

        let Some(parent) = self.stack.last_mut() else {
            self.attach_root(element);
            return;
        };

        if element.forbidden {
            return;
        }
        if element.else_if.is_none() && !element.is_else {
            parent.children.push(TemplateNode::Element(Box::new(element)));
            return;
        }

        // v-else / v-else-if: attach to the closest preceding v-if
        while let Some(last) = parent.children.last() {
            if last.as_element().is_some() {
                break;
            }
            if let Some(text) = last.text().filter(|t| *t != " ") {
                self.diag.warn(
                    format!(
                        "text \"{}\" between v-if and v-else(-if) will be ignored.",
                        text.trim()
                    ),
                    last.range(),
                );
            }
            parent.children.pop();
        }
        match parent
            .children
            .last_mut()
            .and_then(TemplateNode::as_element_mut)
        {
            Some(prev) if prev.if_exp.is_some() => {
                let exp = element.else_if.clone();
                prev.if_conditions.push(IfCondition {
                    exp,
                    block: element,
                });
            }
            _ => {
                let (label, attr) = match &element.else_if {
                    Some(exp) => (format!("else-if=\"{}\"", exp), "v-else-if"),
                    None => ("else".to_owned(), "v-else"),
                };
                self.diag.warn(
                    format!(
                        "v-{} used on element <{}> without corresponding v-if.",
                        label, element.tag
                    ),
                    element.raw_attr_range(attr),
                );
            }
        }
    }

    /// An element closed with no open parent: the root, or a branch chained
    /// onto a root `v-if`.
    fn attach_root(&mut self, element: ElementNode) {
        let chains = self.root.as_ref().map(|root| {
            root.if_exp.is_some() && (element.else_if.is_some() || element.is_else)
        });
        match chains {
            None => self.root = Some(element),
            Some(true) => {
                self.check_root_constraints(&element);
                if let Some(root) = self.root.as_mut() {
                    root.if_conditions.push(IfCondition {
                        exp: element.else_if.clone(),
                        block: element,
                    });
                }
            }
            Some(false) => self.diag.warn_once(
                "Component template should contain exactly one root element. If you are using v-if on multiple elements, use v-else-if to chain them instead.",
                Some(SourceRange::at(element.range.start)),
            ),
        }
    }

    fn parent_context(&self) -> ParentContext {
        let parent = self.stack.last();
        ParentContext {
            tag: parent.map(|p| p.tag.clone()),
            maybe_component: parent.map(|p| self.options.maybe_component(p)),
            in_for: self.stack.iter().any(|a| a.for_clause.is_some()),
            aliases: self
                .stack
                .iter()
                .filter_map(|a| a.for_clause.as_ref().map(|f| f.alias.clone()))
                .collect(),
        }
    }

    fn process_element(&mut self, el: &mut ElementNode) {
        let parent = self.parent_context();

        self.process_key(el, &parent);
        el.plain = el.key.is_none() && el.scoped_slots.is_empty() && el.attrs_list.is_empty();
        if let Some(r) = get_binding_attr(el, "ref", true).filter(|r| !r.is_empty()) {
            el.ref_ = Some(r);
            el.ref_in_for = el.for_clause.is_some() || parent.in_for;
        }
        self.process_slot_content(el, &parent);
        if el.tag.as_str() == "slot" {
            el.slot_name = get_binding_attr(el, "name", true);
            if el.key.is_some() {
                self.diag.warn(
                    "`key` does not work on <slot> because slots are abstract outlets and can possibly expand into multiple elements. Use the key on a wrapping element instead.",
                    raw_binding_attr_range(el, "key"),
                );
            }
        }
        if let Some(component) = get_binding_attr(el, "is", true).filter(|c| !c.is_empty()) {
            el.component = Some(component);
        }
        if el.take_attr("inline-template").is_some() {
            el.inline_template = true;
        }
        for module in &self.options.modules {
            module.transform_node(el, self.options, self.diag);
        }
        self.process_attrs(el, &parent);
    }

    fn process_key(&mut self, el: &mut ElementNode, parent: &ParentContext) {
        let Some(exp) = get_binding_attr(el, "key", true).filter(|k| !k.is_empty()) else {
            return;
        };
        if el.tag.as_str() == "template" {
            self.diag.warn(
                "<template> cannot be keyed. Place the key on real elements instead.",
                raw_binding_attr_range(el, "key"),
            );
        }
        if let Some(clause) = &el.for_clause {
            let iterator = clause.iterator2.as_ref().or(clause.iterator1.as_ref());
            if iterator.is_some_and(|i| !i.is_empty() && *i == exp)
                && parent.tag.as_deref() == Some("transition-group")
            {
                self.diag.tip(
                    "Do not use v-for index as key on <transition-group> children, this is the same as not using keys.",
                    raw_binding_attr_range(el, "key"),
                );
            }
        }
        el.key = Some(exp);
    }

    fn process_slot_content(&mut self, el: &mut ElementNode, parent: &ParentContext) {
        if el.tag.as_str() == "template" {
            let scope = el.take_attr("scope").filter(|s| !s.is_empty());
            if scope.is_some() {
                self.diag.tip(
                    "the \"scope\" attribute for scoped slots have been deprecated and replaced by \"slot-scope\" since 2.5. The new \"slot-scope\" attribute can also be used on plain elements in addition to <template> to denote scoped slots.",
                    el.raw_attr_range("scope"),
                );
            }
            el.slot_scope = scope.or_else(|| el.take_attr("slot-scope").filter(|s| !s.is_empty()));
        } else if let Some(scope) = el.take_attr("slot-scope").filter(|s| !s.is_empty()) {
            if el.attr("v-for").is_some_and(|v| !v.is_empty()) {
                self.diag.tip(
                    format!(
                        "Ambiguous combined usage of slot-scope and v-for on <{}> (v-for takes higher priority). Use a wrapper <template> for the scoped slot to make it clearer.",
                        el.tag
                    ),
                    el.raw_attr_range("slot-scope"),
                );
            }
            el.slot_scope = Some(scope);
        }

        // slot="xxx"
        if let Some(target) = get_binding_attr(el, "slot", true).filter(|t| !t.is_empty()) {
            el.slot_target = Some(if target.as_str() == "\"\"" {
                String::from("\"default\"")
            } else {
                target.clone()
            });
            el.slot_target_dynamic = el.attr(":slot").is_some_and(|v| !v.is_empty())
                || el.attr("v-bind:slot").is_some_and(|v| !v.is_empty());
            // kept as an attribute for native shadow DOM, unless scoped
            if el.tag.as_str() != "template" && el.slot_scope.is_none() {
                let range = self.keep_range_opt(raw_binding_attr_range(el, "slot"));
                el.add_attr(Attr {
                    name: "slot".into(),
                    value: target,
                    dynamic: false,
                    range,
                });
            }
        }

        let Some(binding) = el.take_attr_by(is_slot_attr) else {
            return;
        };
        let range = Some(binding.range);
        let binding_scope = if binding.value.is_empty() {
            String::from(EMPTY_SLOT_SCOPE)
        } else {
            binding.value.clone()
        };

        if el.tag.as_str() == "template" {
            if el.slot_target.is_some() || el.slot_scope.is_some() {
                self.diag.warn(
                    "Unexpected mixed usage of different slot syntaxes.",
                    Some(el.range),
                );
            }
            if parent.maybe_component == Some(false) {
                self.diag.warn(
                    "<template v-slot> can only appear at the root level inside the receiving component",
                    Some(el.range),
                );
            }
            let (name, dynamic) = self.slot_name(&binding);
            el.slot_target = Some(name);
            el.slot_target_dynamic = dynamic;
            el.slot_scope = Some(binding_scope);
            return;
        }

        // v-slot on a component denotes its default slot
        if !self.options.maybe_component(el) {
            self.diag
                .warn("v-slot can only be used on components or <template>.", range);
        }
        if el.slot_scope.is_some() || el.slot_target.is_some() {
            self.diag.warn(
                "Unexpected mixed usage of different slot syntaxes.",
                Some(el.range),
            );
        }
        if !el.scoped_slots.is_empty() {
            self.diag.warn(
                "To avoid scope ambiguity, the default slot should also use <template> syntax when there are other named slots.",
                range,
            );
        }
        let (name, dynamic) = self.slot_name(&binding);
        let mut container = ElementNode::new("template", Vec::new());
        container.slot_target = Some(name.clone());
        container.slot_target_dynamic = dynamic;
        container.children = std::mem::take(&mut el.children)
            .into_iter()
            .filter(|c| !is_scoped_slot(c))
            .collect();
        container.slot_scope = Some(binding_scope);
        el.scoped_slots.insert(name, container);
        el.plain = false;
    }

    fn keep_range_opt(&self, range: Option<SourceRange>) -> Option<SourceRange> {
        range.and_then(|r| self.keep_range(r))
    }

    /// Slot name expression of a `v-slot` attribute and whether it is dynamic.
    fn slot_name(&mut self, binding: &RawAttr) -> (String, bool) {
        let mut name = strip_slot_prefix(&binding.name);
        if name.is_empty() {
            if binding.name.starts_with('#') {
                self.diag.warn(
                    "v-slot shorthand syntax requires a slot name.",
                    Some(binding.range),
                );
            } else {
                name = "default";
            }
        }
        if is_dynamic_arg(name) {
            (String::from(&name[1..name.len() - 1]), true)
        } else {
            (format_compact!("\"{}\"", name), false)
        }
    }

    fn process_attrs(&mut self, el: &mut ElementNode, parent: &ParentContext) {
        let list = std::mem::take(&mut el.attrs_list);
        for raw in &list {
            let range = self.keep_range(raw.range);
            let raw_name = raw.name.as_str();

            if !is_directive(raw_name) {
                if parse_text(&raw.value, self.options.delimiters.as_ref()).is_some() {
                    self.diag.warn(
                        format!(
                            "{}=\"{}\": Interpolation inside attributes has been removed. Use v-bind or the colon shorthand instead. For example, instead of <div id=\"{{{{ val }}}}\">, use <div :id=\"val\">.",
                            raw_name, raw.value
                        ),
                        Some(raw.range),
                    );
                }
                el.add_attr(Attr {
                    name: raw.name.clone(),
                    value: js_string(&raw.value).into(),
                    dynamic: false,
                    range,
                });
                // firefox does not update `muted` when it is set as an attribute
                if el.component.is_none()
                    && raw_name == "muted"
                    && (self.options.must_use_prop)(&el.tag, el.attr("type"), raw_name)
                {
                    el.add_prop(Attr {
                        name: raw.name.clone(),
                        value: "true".into(),
                        dynamic: false,
                        range,
                    });
                }
                continue;
            }

            el.has_bindings = true;
            let modifiers = parse_modifiers(raw_name);
            let name = if modifiers.is_some() {
                strip_modifiers(raw_name)
            } else {
                raw_name
            };

            if let Some(bound) = strip_bind_prefix(name) {
                let value = parse_filters(&raw.value);
                let dynamic = is_dynamic_arg(bound);
                let mut name: std::string::String = if dynamic {
                    bound[1..bound.len() - 1].to_owned()
                } else {
                    bound.to_owned()
                };
                if value.trim().is_empty() {
                    self.diag.warn(
                        format!(
                            "The value for a v-bind expression cannot be empty. Found in \"v-bind:{}\"",
                            name
                        ),
                        None,
                    );
                }
                let as_prop = modifiers.as_ref().is_some_and(|m| m.contains("prop"));
                if let Some(mods) = &modifiers {
                    if as_prop && !dynamic {
                        name = camelize(&name);
                        if name == "innerHtml" {
                            name = "innerHTML".to_owned();
                        }
                    }
                    if mods.contains("camel") && !dynamic {
                        name = camelize(&name);
                    }
                    if mods.contains("sync") {
                        let sync = gen_assignment_code(&value, "$event");
                        if !dynamic {
                            let camel = camelize(&name);
                            add_handler(
                                el,
                                &format!("update:{}", camel),
                                &sync,
                                None,
                                false,
                                Some(&mut *self.diag),
                                range,
                                false,
                            );
                            let hyphen = hyphenate(&name);
                            if hyphen != camel {
                                add_handler(
                                    el,
                                    &format!("update:{}", hyphen),
                                    &sync,
                                    None,
                                    false,
                                    Some(&mut *self.diag),
                                    range,
                                    false,
                                );
                            }
                        } else {
                            add_handler(
                                el,
                                &format!("\"update:\"+({})", name),
                                &sync,
                                None,
                                false,
                                Some(&mut *self.diag),
                                range,
                                true,
                            );
                        }
                    }
                }
                let attr = Attr {
                    name: name.as_str().into(),
                    value: value.into(),
                    dynamic,
                    range,
                };
                if as_prop
                    || (el.component.is_none()
                        && (self.options.must_use_prop)(&el.tag, el.attr("type"), &name))
                {
                    el.add_prop(attr);
                } else {
                    el.add_attr(attr);
                }
            } else if let Some(event) = strip_on_prefix(name) {
                let dynamic = is_dynamic_arg(event);
                let event = if dynamic {
                    &event[1..event.len() - 1]
                } else {
                    event
                };
                add_handler(
                    el,
                    event,
                    &raw.value,
                    modifiers,
                    false,
                    Some(&mut *self.diag),
                    range,
                    dynamic,
                );
            } else {
                let name = strip_directive_prefix(name);
                let (name, arg) = match name.find(':') {
                    Some(i) => (&name[..i], Some(&name[i + 1..])),
                    None => (name, None),
                };
                let (arg, is_dynamic_arg) = match arg.filter(|a| !a.is_empty()) {
                    Some(a) if is_dynamic_arg(a) => (Some(&a[1..a.len() - 1]), true),
                    other => (other, false),
                };
                el.add_directive(DirectiveNode {
                    name: name.into(),
                    raw_name: raw.name.clone(),
                    value: raw.value.clone(),
                    arg: arg.map(String::from),
                    is_dynamic_arg,
                    modifiers,
                    range,
                });
                if name == "model" {
                    self.check_for_alias_model(el, &raw.value, parent);
                }
            }
        }
    }

    fn check_for_alias_model(&mut self, el: &ElementNode, value: &str, parent: &ParentContext) {
        let own = el.for_clause.as_ref().map(|f| &f.alias);
        for alias in own.into_iter().chain(parent.aliases.iter().rev()) {
            if alias.as_str() == value {
                self.diag.warn(
                    format!(
                        "<{} v-model=\"{}\">: You are binding v-model directly to a v-for iteration alias. This will not be able to modify the v-for source array because writing to the alias is like modifying a function local variable. Consider using an object property instead.",
                        el.tag, value
                    ),
                    el.raw_attr_range("v-model"),
                );
            }
        }
    }
}

fn is_scoped_slot(node: &TemplateNode) -> bool {
    node.as_element().is_some_and(|el| el.slot_scope.is_some())
}
