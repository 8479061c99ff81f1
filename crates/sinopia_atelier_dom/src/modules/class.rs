//! `class` / `:class` handling.

use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_armature::{get_binding_attr, parse_text};
use sinopia_carton::{format_compact, js_string, String};
use sinopia_relief::{Code, CompilerModule, CompilerOptions, Diagnostics, ElementNode, PropKey};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Moves `class` into `staticClass` and `:class` into `class`.
pub struct ClassModule;

impl CompilerModule for ClassModule {
    fn name(&self) -> &'static str {
        "class"
    }

    fn static_keys(&self) -> &'static [&'static str] {
        &["staticClass"]
    }

    fn transform_node(&self, el: &mut ElementNode, options: &CompilerOptions, diag: &mut Diagnostics) {
        if let Some(static_class) = el.take_attr("class") {
            if parse_text(&static_class, options.delimiters.as_ref()).is_some() {
                diag.warn(
                    format_compact!(
                        "class=\"{}\": Interpolation inside attributes has been removed. \
                         Use v-bind or the colon shorthand instead. For example, \
                         instead of <div class=\"{{{{ val }}}}\">, use <div :class=\"val\">.",
                        static_class
                    ),
                    el.raw_attr_range("class"),
                );
            }
            let collapsed = WHITESPACE_RE.replace_all(&static_class, " ");
            el.static_class = Some(js_string(collapsed.trim()).into());
        }
        if let Some(binding) = get_binding_attr(el, "class", false) {
            el.class_binding = Some(binding);
        }
    }

    fn gen_data(&self, el: &ElementNode) -> Vec<(PropKey, Code)> {
        let mut entries = Vec::new();
        if let Some(static_class) = &el.static_class {
            entries.push((
                PropKey::Ident(String::from("staticClass")),
                Code::expr(static_class.clone()),
            ));
        }
        if let Some(binding) = &el.class_binding {
            entries.push((PropKey::Ident(String::from("class")), Code::expr(binding.clone())));
        }
        entries
    }
}
