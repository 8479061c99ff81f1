//! DOM compiler options.

use serde::{Deserialize, Serialize};
use sinopia_atelier_core::CompileOptions;
use sinopia_carton::String;
use sinopia_relief::{CompilerOptions, WhitespaceStrategy};

use crate::directives::dom_directives;
use crate::modules::dom_modules;

/// DOM compiler options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomCompilerOptions {
    /// Interpolation delimiters, e.g. `["[[", "]]"]`
    #[serde(default)]
    pub delimiters: Option<(String, String)>,

    /// Whitespace handling; overrides `preserve_whitespace`
    #[serde(default)]
    pub whitespace: Option<WhitespaceStrategy>,

    /// Keep whitespace-only text between elements
    #[serde(default)]
    pub preserve_whitespace: Option<bool>,

    /// Whether to preserve comments
    #[serde(default)]
    pub comments: bool,

    /// Report diagnostics with source ranges
    #[serde(default)]
    pub output_source_range: bool,

    /// Whether to hoist static subtrees
    #[serde(default = "default_true")]
    pub optimize: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DomCompilerOptions {
    fn default() -> Self {
        Self {
            delimiters: None,
            whitespace: None,
            preserve_whitespace: None,
            comments: false,
            output_source_range: false,
            optimize: true,
        }
    }
}

impl DomCompilerOptions {
    /// Per-call overrides for the DOM compiler.
    pub fn to_compile_options(&self) -> CompileOptions {
        CompileOptions {
            delimiters: self.delimiters.clone(),
            whitespace: self.whitespace,
            preserve_whitespace: self.preserve_whitespace,
            output_source_range: self.output_source_range,
            comments: Some(self.comments),
            optimize: Some(self.optimize),
            ..CompileOptions::default()
        }
    }
}

fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}

/// Base options of the web platform: HTML parsing rules, the class and
/// style modules, and the `text` / `html` / `model` directives.
pub fn base_options() -> CompilerOptions {
    CompilerOptions {
        expect_html: true,
        modules: dom_modules(),
        directives: dom_directives(),
        is_pre_tag,
        is_unary_tag: sinopia_carton::is_unary_tag,
        must_use_prop: sinopia_carton::must_use_prop,
        can_be_left_open_tag: sinopia_carton::can_be_left_open_tag,
        is_reserved_tag: sinopia_carton::is_reserved_tag,
        get_tag_namespace: sinopia_carton::get_tag_namespace,
        ..CompilerOptions::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case() {
        let options: DomCompilerOptions = serde_json::from_str(
            r#"{"delimiters":["[[","]]"],"whitespace":"condense","outputSourceRange":true}"#,
        )
        .unwrap();
        assert_eq!(options.delimiters, Some(("[[".into(), "]]".into())));
        assert_eq!(options.whitespace, Some(WhitespaceStrategy::Condense));
        assert!(options.output_source_range);
        assert!(options.optimize);
    }

    #[test]
    fn test_base_options() {
        let options = base_options();
        let keys = options.module_static_keys();
        assert_eq!(keys, ["staticClass", "staticStyle"]);
        assert!((options.is_pre_tag)("pre"));
        assert!(!(options.is_reserved_tag)("my-comp"));
        assert!(options.directives.contains_key("model"));
    }
}
