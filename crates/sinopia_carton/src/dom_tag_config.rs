//! Tag tables for the web platform.
//!
//! Perfect-hash sets built at compile time; every predicate is case-sensitive,
//! matching how templates are authored.

use phf::{phf_set, Set};

static HTML_TAGS: Set<&'static str> = phf_set! {
    "html", "body", "base", "head", "link", "meta", "style", "title",
    "address", "article", "aside", "footer", "header", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "nav", "section",
    "div", "dd", "dl", "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main",
    "ol", "p", "pre", "ul",
    "a", "b", "abbr", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd",
    "mark", "q", "rp", "rt", "rtc", "ruby",
    "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var", "wbr", "area",
    "audio", "map", "track", "video",
    "embed", "object", "param", "source", "canvas", "script", "noscript", "del", "ins",
    "caption", "col", "colgroup", "table", "thead", "tbody", "td", "th", "tr",
    "button", "datalist", "fieldset", "form", "input", "label", "legend", "meter",
    "optgroup", "option", "output", "progress", "select", "textarea",
    "details", "dialog", "menu", "menuitem", "summary",
    "content", "element", "shadow", "template", "blockquote", "iframe", "tfoot",
};

static SVG_TAGS: Set<&'static str> = phf_set! {
    "svg", "animate", "circle", "clippath", "cursor", "defs", "desc", "ellipse", "filter",
    "font-face", "foreignobject", "g", "glyph", "image", "line", "marker", "mask",
    "missing-glyph", "path", "pattern", "polygon", "polyline", "rect", "switch", "symbol",
    "text", "textpath", "tspan", "use", "view",
};

static UNARY_TAGS: Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
};

// Elements whose end tag may be omitted.
static LEFT_OPEN_TAGS: Set<&'static str> = phf_set! {
    "colgroup", "dd", "dt", "li", "options", "p", "td", "tfoot", "th", "thead", "tr", "source",
};

static NON_PHRASING_TAGS: Set<&'static str> = phf_set! {
    "address", "article", "aside", "base", "blockquote", "body", "caption", "col",
    "colgroup", "dd", "details", "dialog", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header",
    "hgroup", "hr", "html", "legend", "li", "menuitem", "meta", "optgroup", "option",
    "param", "rp", "rt", "source", "style", "summary", "tbody", "td", "tfoot", "th",
    "thead", "title", "tr", "track",
};

static ACCEPT_VALUE_TAGS: Set<&'static str> = phf_set! {
    "input", "textarea", "option", "select", "progress",
};

/// Check if a tag is a known HTML element.
#[inline]
pub fn is_html_tag(tag: &str) -> bool {
    HTML_TAGS.contains(tag)
}

/// Check if a tag is a known SVG element.
#[inline]
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(tag)
}

/// Platform tags are never treated as components.
#[inline]
pub fn is_reserved_tag(tag: &str) -> bool {
    is_html_tag(tag) || is_svg_tag(tag)
}

/// Tags that never carry children (`<br>`, `<img>`, ...).
#[inline]
pub fn is_unary_tag(tag: &str) -> bool {
    UNARY_TAGS.contains(tag)
}

#[inline]
pub fn can_be_left_open_tag(tag: &str) -> bool {
    LEFT_OPEN_TAGS.contains(tag)
}

/// Flow content that implicitly closes an open `<p>`.
#[inline]
pub fn is_non_phrasing_tag(tag: &str) -> bool {
    NON_PHRASING_TAGS.contains(tag)
}

#[inline]
pub fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}

/// Elements whose content is consumed as raw text.
#[inline]
pub fn is_plain_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea")
}

/// Elements that drop a newline immediately after the start tag.
#[inline]
pub fn is_ignore_newline_tag(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea")
}

/// Framework-provided abstract tags.
#[inline]
pub fn is_built_in_tag(tag: &str) -> bool {
    matches!(tag, "slot" | "component")
}

/// Attributes that must be bound as DOM properties rather than attributes.
pub fn must_use_prop(tag: &str, attr_type: Option<&str>, attr: &str) -> bool {
    (attr == "value" && ACCEPT_VALUE_TAGS.contains(tag) && attr_type != Some("button"))
        || (attr == "selected" && tag == "option")
        || (attr == "checked" && tag == "input")
        || (attr == "muted" && tag == "video")
}

/// Namespace for tags that switch the parser out of HTML.
pub fn get_tag_namespace(tag: &str) -> Option<&'static str> {
    if is_svg_tag(tag) {
        Some("svg")
    } else if tag == "math" {
        Some("math")
    } else {
        None
    }
}
