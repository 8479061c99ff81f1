//! `style` / `:style` handling.

use sinopia_armature::{get_binding_attr, parse_text};
use sinopia_carton::{format_compact, js_string, String};
use sinopia_relief::{Code, CompilerModule, CompilerOptions, Diagnostics, ElementNode, PropKey};

/// Moves `style` into a parsed `staticStyle` object and `:style` into `style`.
pub struct StyleModule;

impl CompilerModule for StyleModule {
    fn name(&self) -> &'static str {
        "style"
    }

    fn static_keys(&self) -> &'static [&'static str] {
        &["staticStyle"]
    }

    fn transform_node(&self, el: &mut ElementNode, options: &CompilerOptions, diag: &mut Diagnostics) {
        if let Some(static_style) = el.take_attr("style") {
            if parse_text(&static_style, options.delimiters.as_ref()).is_some() {
                diag.warn(
                    format_compact!(
                        "style=\"{}\": Interpolation inside attributes has been removed. \
                         Use v-bind or the colon shorthand instead. For example, \
                         instead of <div style=\"{{{{ val }}}}\">, use <div :style=\"val\">.",
                        static_style
                    ),
                    el.raw_attr_range("style"),
                );
            }
            el.static_style = Some(style_object_literal(&parse_style_text(&static_style)));
        }
        if let Some(binding) = get_binding_attr(el, "style", false) {
            el.style_binding = Some(binding);
        }
    }

    fn gen_data(&self, el: &ElementNode) -> Vec<(PropKey, Code)> {
        let mut entries = Vec::new();
        if let Some(static_style) = &el.static_style {
            entries.push((
                PropKey::Ident(String::from("staticStyle")),
                Code::expr(static_style.clone()),
            ));
        }
        if let Some(binding) = &el.style_binding {
            entries.push((
                PropKey::Ident(String::from("style")),
                Code::paren(Code::expr(binding.clone())),
            ));
        }
        entries
    }
}

/// Split inline CSS into `(property, value)` pairs.
///
/// Declarations are separated by `;` except inside parentheses
/// (`url(data:...;base64,...)`); a repeated property keeps its first position
/// and its last value.
pub fn parse_style_text(text: &str) -> Vec<(String, String)> {
    let mut declarations: Vec<(String, String)> = Vec::new();
    for item in split_declarations(text) {
        let Some((property, value)) = item.split_once(':') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let property = String::from(property.trim());
        let value = String::from(value.trim());
        match declarations.iter_mut().find(|(p, _)| *p == property) {
            Some(existing) => existing.1 = value,
            None => declarations.push((property, value)),
        }
    }
    declarations
}

/// Split at every `;` whose next parenthesis, if any, is an opening one.
fn split_declarations(text: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c != ';' {
            continue;
        }
        let rest = &text[i + 1..];
        let inside_parens = rest
            .find(['(', ')'])
            .is_some_and(|p| rest.as_bytes()[p] == b')');
        if !inside_parens {
            items.push(&text[start..i]);
            start = i + 1;
        }
    }
    items.push(&text[start..]);
    items
}

fn style_object_literal(declarations: &[(String, String)]) -> String {
    let mut out = String::from("{");
    for (i, (property, value)) in declarations.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&js_string(property));
        out.push(':');
        out.push_str(&js_string(value));
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Vec<(std::string::String, std::string::String)> {
        parse_style_text(text)
            .into_iter()
            .map(|(p, v)| (p.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_style_text() {
        assert_eq!(
            pairs("color: red; font-size:12px;"),
            [
                ("color".to_string(), "red".to_string()),
                ("font-size".to_string(), "12px".to_string())
            ]
        );
    }

    #[test]
    fn test_semicolon_inside_parens() {
        assert_eq!(
            pairs("background: url(data:image/png;base64,AAA); color: blue"),
            [
                ("background".to_string(), "url(data:image/png;base64,AAA)".to_string()),
                ("color".to_string(), "blue".to_string())
            ]
        );
    }

    #[test]
    fn test_repeated_property_and_junk() {
        assert_eq!(
            pairs("color: red; junk; color: blue"),
            [("color".to_string(), "blue".to_string())]
        );
    }

    #[test]
    fn test_object_literal() {
        let declarations = parse_style_text("color: red; content: \"x\"");
        assert_eq!(
            style_object_literal(&declarations),
            r#"{"color":"red","content":"\"x\""}"#
        );
    }
}
