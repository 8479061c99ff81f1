//! General string helpers shared by the compiler and runtime.

use once_cell::sync::Lazy;
use regex::Regex;

static CAMELIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\w)").unwrap());
static HYPHENATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^-])([A-Z])").unwrap());

/// `foo-bar` -> `fooBar`
pub fn camelize(s: &str) -> std::string::String {
    CAMELIZE_RE
        .replace_all(s, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

/// `foo` -> `Foo`
pub fn capitalize(s: &str) -> std::string::String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => std::string::String::new(),
    }
}

/// `fooBar` -> `foo-bar`
pub fn hyphenate(s: &str) -> std::string::String {
    // Two passes so that consecutive capitals (`fooBAR`) all split.
    let once = HYPHENATE_RE.replace_all(s, "$1-$2");
    HYPHENATE_RE.replace_all(&once, "$1-$2").to_lowercase()
}

/// Quote a string as a JavaScript string literal.
///
/// JSON quoting plus escapes for U+2028/U+2029, which are line terminators
/// inside JS string literals.
pub fn js_string(s: &str) -> std::string::String {
    let quoted = serde_json::Value::String(s.to_owned()).to_string();
    quoted.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
}

/// Whether `s` is a valid JavaScript-style identifier path segment.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
