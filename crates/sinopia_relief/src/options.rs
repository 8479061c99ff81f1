//! Compiler options.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sinopia_carton::{FxHashMap, String};

use crate::{Attr, Code, Diagnostics, DirectiveNode, ElementNode, Handler, PropKey};

/// Whitespace handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceStrategy {
    /// Drop whitespace-only text containing a line break, collapse the rest
    #[default]
    Condense,
    /// Keep whitespace-only text as a single space
    Preserve,
}

/// A platform module: claims attributes while parsing and contributes
/// entries to the generated data object.
pub trait CompilerModule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Element keys this module introduces that do not make an element dynamic.
    fn static_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs once per element after key/ref/slot/component processing and
    /// before generic attribute processing.
    fn transform_node(
        &self,
        _el: &mut ElementNode,
        _options: &CompilerOptions,
        _diag: &mut Diagnostics,
    ) {
    }

    /// Data object entries, inserted after the component tag entry.
    fn gen_data(&self, _el: &ElementNode) -> Vec<(PropKey, Code)> {
        Vec::new()
    }
}

/// `v-bind="object"` wrapping of the generated data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataWrap {
    pub value: String,
    pub as_prop: bool,
    pub sync: bool,
}

/// Component `v-model` data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentModel {
    /// Parenthesized bound expression.
    pub value: String,
    /// Bound expression as a string literal.
    pub expression: String,
    /// Assignment statement run with `$$v` bound to the new value.
    pub assignment: String,
}

/// What a directive generator contributes to its element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOutput {
    /// Keep a runtime directive descriptor in `directives:[...]`.
    pub needs_runtime: bool,
    /// DOM properties appended after the element's own.
    pub props: Vec<Attr>,
    /// Listeners to register as `(event, handler, important)`; important
    /// ones run ahead of the element's own for the same event.
    pub handlers: Vec<(String, Handler, bool)>,
    pub wrap_data: Option<DataWrap>,
    /// `v-on="object"` listeners merged into the data.
    pub wrap_listeners: Option<String>,
    pub model: Option<ComponentModel>,
}

impl DirectiveOutput {
    /// Runtime-only directive: no compile-time output.
    pub fn runtime() -> Self {
        Self {
            needs_runtime: true,
            ..Self::default()
        }
    }
}

/// Compile-time handling for a directive name.
pub trait DirectiveGenerator: Send + Sync {
    fn generate(
        &self,
        el: &ElementNode,
        dir: &DirectiveNode,
        diag: &mut Diagnostics,
    ) -> DirectiveOutput;
}

fn no(_: &str) -> bool {
    false
}

fn no_prop(_: &str, _: Option<&str>, _: &str) -> bool {
    false
}

fn no_namespace(_: &str) -> Option<&'static str> {
    None
}

/// Compiler options
#[derive(Clone)]
pub struct CompilerOptions {
    /// Custom interpolation delimiters (default: `{{` and `}}`)
    pub delimiters: Option<(String, String)>,
    /// Explicit whitespace mode; `None` falls back to `preserve_whitespace`
    pub whitespace: Option<WhitespaceStrategy>,
    /// Legacy switch: keep whitespace-only text between elements as a space
    pub preserve_whitespace: bool,
    /// Keep source ranges on nodes and diagnostics
    pub output_source_range: bool,
    /// Keep comments in the output
    pub comments: bool,
    /// Apply HTML auto-closing rules (`<p>` closed by block content)
    pub expect_html: bool,
    /// Decode `&#10;`/`&#9;` inside attribute values
    pub should_decode_newlines: bool,
    pub should_decode_newlines_for_href: bool,
    /// Run the static optimizer
    pub optimize: bool,
    pub modules: Vec<Arc<dyn CompilerModule>>,
    pub directives: FxHashMap<String, Arc<dyn DirectiveGenerator>>,
    /// Extra element keys that keep an element static
    pub static_keys: Vec<String>,
    pub is_reserved_tag: fn(&str) -> bool,
    pub must_use_prop: fn(&str, Option<&str>, &str) -> bool,
    pub get_tag_namespace: fn(&str) -> Option<&'static str>,
    pub is_unary_tag: fn(&str) -> bool,
    pub can_be_left_open_tag: fn(&str) -> bool,
    pub is_pre_tag: fn(&str) -> bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            delimiters: None,
            whitespace: None,
            preserve_whitespace: true,
            output_source_range: false,
            comments: false,
            expect_html: false,
            should_decode_newlines: false,
            should_decode_newlines_for_href: false,
            optimize: true,
            modules: Vec::new(),
            directives: FxHashMap::default(),
            static_keys: Vec::new(),
            is_reserved_tag: no,
            must_use_prop: no_prop,
            get_tag_namespace: no_namespace,
            is_unary_tag: no,
            can_be_left_open_tag: no,
            is_pre_tag: no,
        }
    }
}

impl CompilerOptions {
    /// A component tag, or a tag that is not a platform element.
    ///
    /// Looks at the written `is` attributes too, so it answers the same
    /// before and after the element's own attributes are processed.
    pub fn maybe_component(&self, el: &ElementNode) -> bool {
        if el.component.is_some() || el.has_attr(":is") || el.has_attr("v-bind:is") {
            return true;
        }
        match el.attr("is") {
            Some(is) => !(self.is_reserved_tag)(is),
            None => !(self.is_reserved_tag)(&el.tag),
        }
    }

    /// All static keys from the modules plus user-supplied ones.
    pub fn module_static_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for module in &self.modules {
            keys.extend(module.static_keys().iter().map(|k| String::from(*k)));
        }
        keys.extend(self.static_keys.iter().cloned());
        keys
    }
}

impl fmt::Debug for CompilerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<_> = self.modules.iter().map(|m| m.name()).collect();
        let mut directives: Vec<_> = self.directives.keys().map(|k| k.as_str()).collect();
        directives.sort_unstable();
        f.debug_struct("CompilerOptions")
            .field("delimiters", &self.delimiters)
            .field("whitespace", &self.whitespace)
            .field("preserve_whitespace", &self.preserve_whitespace)
            .field("output_source_range", &self.output_source_range)
            .field("comments", &self.comments)
            .field("expect_html", &self.expect_html)
            .field("optimize", &self.optimize)
            .field("modules", &modules)
            .field("directives", &directives)
            .field("static_keys", &self.static_keys)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeysModule;

    impl CompilerModule for KeysModule {
        fn name(&self) -> &'static str {
            "keys"
        }

        fn static_keys(&self) -> &'static [&'static str] {
            &["staticClass"]
        }
    }

    #[test]
    fn test_module_static_keys_merge() {
        let options = CompilerOptions {
            modules: vec![Arc::new(KeysModule)],
            static_keys: vec!["custom".into()],
            ..Default::default()
        };
        let keys = options.module_static_keys();
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["staticClass", "custom"]);
    }

    #[test]
    fn test_default_treats_every_tag_as_component() {
        let options = CompilerOptions::default();
        assert!(options.maybe_component(&ElementNode::new("div", vec![])));
    }
}
