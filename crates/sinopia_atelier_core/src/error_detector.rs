//! Expression validation.
//!
//! Every directive value and interpolation is parsed with oxc in the shape
//! it is evaluated in (a function body, a parameter list, a `var` binding),
//! so template mistakes surface as compile warnings instead of render-time
//! failures.

use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use regex::Regex;
use sinopia_carton::{format_compact, FxHashSet, String};
use sinopia_relief::{Diagnostics, ElementNode, SourceRange, TemplateNode};

/// Keywords that usually mean a property was named after one (`a.if` is
/// fine, `if.a` is not).
static PROHIBITED_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    const KEYWORDS: &str = "do,if,for,let,new,try,var,case,else,with,await,break,catch,class,const,\
        super,throw,while,yield,delete,export,import,return,switch,default,\
        extends,finally,continue,debugger,function,arguments";
    let alternatives: Vec<std::string::String> =
        KEYWORDS.split(',').map(|kw| format!(r"\b{}\b", kw)).collect();
    Regex::new(&alternatives.join("|")).unwrap()
});
static UNARY_OPERATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bdelete\s*\([^)]*\)|\btypeof\s*\([^)]*\)|\bvoid\s*\([^)]*\)").unwrap()
});
/// String and template literal contents, so keywords inside them are ignored.
static STRIP_STRING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|`(?:[^`\\]|\\.)*\$\{|\}(?:[^`\\]|\\.)*`|`(?:[^`\\]|\\.)*`"#,
    )
    .unwrap()
});

/// The first syntax error in `source`, parsed as a script where a top-level
/// `return` is allowed.
fn syntax_error(source: &str) -> Option<std::string::String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs())
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        })
        .parse();
    ret.errors.first().map(|error| error.to_string())
}

fn is_directive_name(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with(['@', ':', '#'])
}

/// Walk the tree and warn about every expression that would not evaluate.
pub fn detect_errors(ast: Option<&ElementNode>, diag: &mut Diagnostics) {
    if let Some(root) = ast {
        check_element(root, diag);
    }
}

fn check_element(el: &ElementNode, diag: &mut Diagnostics) {
    let mut seen = FxHashSet::default();
    for raw in &el.raw_attrs {
        let name = raw.name.as_str();
        if !is_directive_name(name) || !seen.insert(name) {
            continue;
        }
        let Some(value) = el.attr(name).filter(|v| !v.is_empty()) else {
            continue;
        };
        let range = el.raw_attr_range(name);
        let text = format_compact!("{}=\"{}\"", name, value);
        if name == "v-for" {
            check_for(el, &text, range, diag);
        } else if name == "v-slot" || name.starts_with('#') {
            check_function_params(value, &text, range, diag);
        } else if name.starts_with('@') || name.starts_with("v-on:") {
            check_event(value, &text, range, diag);
        } else {
            check_expression(value, &text, range, diag);
        }
    }

    for child in &el.children {
        match child {
            TemplateNode::Element(child) => check_element(child, diag),
            TemplateNode::Expression(node) => {
                check_expression(&node.expression, &node.text, node.range, diag)
            }
            TemplateNode::Text(_) | TemplateNode::Comment(_) => {}
        }
    }
    // branches and slot templates are detached from `children`
    for condition in &el.if_conditions {
        check_element(&condition.block, diag);
    }
    for (_, slot) in el.scoped_slots.iter() {
        check_element(slot, diag);
    }
}

fn check_event(exp: &str, text: &str, range: Option<SourceRange>, diag: &mut Diagnostics) {
    let stripped = STRIP_STRING_RE.replace_all(exp, "");
    if let Some(found) = UNARY_OPERATOR_RE.find(&stripped) {
        if !stripped[..found.start()].ends_with('$') {
            diag.warn(
                format_compact!(
                    "avoid using JavaScript unary operator as property name: \"{}\" in expression {}",
                    found.as_str(),
                    text.trim()
                ),
                range,
            );
        }
    }
    check_expression(exp, text, range, diag);
}

fn check_for(el: &ElementNode, text: &str, range: Option<SourceRange>, diag: &mut Diagnostics) {
    let Some(clause) = &el.for_clause else {
        return;
    };
    check_expression(&clause.source, text, range, diag);
    check_identifier(&clause.alias, "v-for alias", text, range, diag);
    for iterator in [&clause.iterator1, &clause.iterator2].into_iter().flatten() {
        check_identifier(iterator, "v-for iterator", text, range, diag);
    }
}

fn check_identifier(
    ident: &str,
    kind: &str,
    text: &str,
    range: Option<SourceRange>,
    diag: &mut Diagnostics,
) {
    if syntax_error(&format!("var {}=_", ident)).is_some() {
        diag.warn(
            format_compact!("invalid {} \"{}\" in expression: {}", kind, ident, text.trim()),
            range,
        );
    }
}

fn check_expression(exp: &str, text: &str, range: Option<SourceRange>, diag: &mut Diagnostics) {
    let Some(error) = syntax_error(&format!("return {}", exp)) else {
        return;
    };
    let stripped = STRIP_STRING_RE.replace_all(exp, "");
    let msg: String = match PROHIBITED_KEYWORD_RE.find(&stripped) {
        Some(keyword) => format_compact!(
            "avoid using JavaScript keyword as property name: \"{}\"\n  Raw expression: {}",
            keyword.as_str(),
            text.trim()
        ),
        None => format_compact!(
            "invalid expression: {} in\n\n    {}\n\n  Raw expression: {}\n",
            error,
            exp,
            text.trim()
        ),
    };
    diag.warn(msg, range);
}

fn check_function_params(exp: &str, text: &str, range: Option<SourceRange>, diag: &mut Diagnostics) {
    if let Some(error) = syntax_error(&format!("function _({}) {{}}", exp)) {
        diag.warn(
            format_compact!(
                "invalid function parameter expression: {} in\n\n    {}\n\n  Raw expression: {}\n",
                error,
                exp,
                text.trim()
            ),
            range,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_armature::parse;
    use sinopia_relief::CompilerOptions;

    fn errors(src: &str) -> Vec<std::string::String> {
        let options = CompilerOptions::default();
        let mut parse_diag = Diagnostics::new();
        let ast = parse(src, &options, &mut parse_diag);
        let mut diag = Diagnostics::new();
        detect_errors(ast.as_ref(), &mut diag);
        diag.errors().iter().map(|e| e.msg.to_string()).collect()
    }

    #[test]
    fn test_valid_template_is_clean() {
        assert!(errors(r#"<div :a="b + c" @click="go($event)"><p v-for="(x, i) in xs">{{ x.y }}</p></div>"#)
            .is_empty());
    }

    #[test]
    fn test_keyword_as_property() {
        assert_eq!(
            errors(r#"<div :a="delete.x"></div>"#),
            ["avoid using JavaScript keyword as property name: \"delete\"\n  Raw expression: :a=\"delete.x\""]
        );
    }

    #[test]
    fn test_invalid_expression() {
        let errors = errors(r#"<div v-if="a +"></div>"#);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("invalid expression: "));
        assert!(errors[0].ends_with("in\n\n    a +\n\n  Raw expression: v-if=\"a +\"\n"));
    }

    #[test]
    fn test_keywords_inside_strings_ignored() {
        let errors = errors(r#"<div :a="'if' +"></div>"#);
        assert!(errors[0].starts_with("invalid expression: "));
    }

    #[test]
    fn test_unary_operator_in_handler() {
        let errors = errors(r#"<div @click="delete(item)"></div>"#);
        assert_eq!(
            errors[0],
            "avoid using JavaScript unary operator as property name: \"delete(item)\" in expression @click=\"delete(item)\""
        );
        assert!(self::errors(r#"<div @click="$delete(obj, k)"></div>"#).is_empty());
    }

    #[test]
    fn test_invalid_for_alias() {
        let errors = errors(r#"<div><p v-for="foo-bar in list"></p></div>"#);
        assert_eq!(
            errors,
            ["invalid v-for alias \"foo-bar\" in expression: v-for=\"foo-bar in list\""]
        );
    }

    #[test]
    fn test_slot_params() {
        let errors = errors(r#"<comp><template #item="{ a b }">x</template></comp>"#);
        assert!(errors[0].starts_with("invalid function parameter expression: "));
        assert!(self::errors(r#"<comp><template #item="{ a, b }">x</template></comp>"#).is_empty());
    }

    #[test]
    fn test_interpolation_checked() {
        let errors = errors("<div>{{ a.if + }}</div>");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("avoid using JavaScript keyword as property name: \"if\""));
    }
}
