//! Interpolation parsing for text content.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_carton::{js_string, String};
use sinopia_relief::TextToken;

use crate::filter_parser::parse_filters;

static DEFAULT_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{((?s:.)+?)\}\}").unwrap());

// Compiled patterns for custom delimiters, shared by every parser instance.
static DELIMITER_RES: Lazy<DashMap<(String, String), Regex>> = Lazy::new(DashMap::new);

/// Result of parsing interpolated text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText {
    /// Render expression: quoted literals and `_s(..)` calls joined by `+`.
    pub expression: String,
    pub tokens: Vec<TextToken>,
}

fn delimiter_regex(open: &str, close: &str) -> Regex {
    let key = (String::from(open), String::from(close));
    if let Some(re) = DELIMITER_RES.get(&key) {
        return re.clone();
    }
    let pattern = format!("{}((?s:.)+?){}", regex::escape(open), regex::escape(close));
    let re = Regex::new(&pattern).unwrap_or_else(|_| DEFAULT_TAG_RE.clone());
    DELIMITER_RES.insert(key, re.clone());
    re
}

/// Parse `text` for interpolations; `None` when it contains none.
pub fn parse_text(text: &str, delimiters: Option<&(String, String)>) -> Option<ParsedText> {
    let re = match delimiters {
        Some((open, close)) => delimiter_regex(open, close),
        None => DEFAULT_TAG_RE.clone(),
    };
    if !re.is_match(text) {
        return None;
    }

    let mut parts: Vec<std::string::String> = Vec::new();
    let mut tokens = Vec::new();
    let mut last_index = 0;
    for caps in re.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last_index {
            let literal = &text[last_index..whole.start()];
            parts.push(js_string(literal));
            tokens.push(TextToken::Literal(literal.into()));
        }
        let exp = parse_filters(inner.as_str().trim());
        parts.push(format!("_s({})", exp));
        tokens.push(TextToken::Binding(exp.into()));
        last_index = whole.end();
    }
    if last_index < text.len() {
        let literal = &text[last_index..];
        parts.push(js_string(literal));
        tokens.push(TextToken::Literal(literal.into()));
    }

    Some(ParsedText {
        expression: parts.join("+").into(),
        tokens,
    })
}
