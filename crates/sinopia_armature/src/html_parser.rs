//! Streaming HTML scanner.
//!
//! Repeatedly matches, at the current offset, a comment, conditional comment,
//! doctype, end tag, start tag, or a run of text, and reports each through
//! [`HtmlHandler`]. Only a stack of open tag names is kept here; building the
//! tree is the handler's job. The scanner follows browser leniency: stray `<`
//! is text, `</br>` becomes `<br>`, a lone `</p>` becomes `<p></p>`, and with
//! `expect_html` a `<p>` is closed by following block content.

use once_cell::sync::Lazy;
use regex::Regex;
use sinopia_carton::{is_ignore_newline_tag, is_plain_text_element, FxHashMap, String};
use sinopia_relief::{RawAttr, SourceRange};

const NCNAME: &str = r"[a-zA-Z_][\-.0-9_a-zA-Z\x{00B7}\x{00C0}-\x{00D6}\x{00D8}-\x{00F6}\x{00F8}-\x{037D}\x{037F}-\x{1FFF}\x{200C}-\x{200D}\x{203F}-\x{2040}\x{2070}-\x{218F}\x{2C00}-\x{2FEF}\x{3001}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFFD}]*";

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([^\s"'<>/=]+)(?:\s*(=)\s*(?:"([^"]*)"+|'([^']*)'+|([^\s"'=<>`]+)))?"#)
        .unwrap()
});
static DYNAMIC_ARG_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*((?:v-[\w-]+:|@|:|#)\[[^=]+?\][^\s"'<>/=]*)(?:\s*(=)\s*(?:"([^"]*)"+|'([^']*)'+|([^\s"'=<>`]+)))?"#,
    )
    .unwrap()
});
static START_TAG_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^<((?:{NCNAME}:)?{NCNAME})")).unwrap());
static START_TAG_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(/?)>").unwrap());
static END_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^</((?:{NCNAME}:)?{NCNAME})[^>]*>")).unwrap());
static DOCTYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<!DOCTYPE [^>]+>").unwrap());
static ENCODED_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:lt|gt|quot|amp|#39);").unwrap());
static ENCODED_ATTR_WITH_NEWLINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:lt|gt|quot|amp|#39|#10|#9);").unwrap());

const COMMENT_OPEN: &str = "<!--";
const CONDITIONAL_COMMENT_OPEN: &str = "<![";

/// Structural callbacks fired by the scanner.
pub trait HtmlHandler {
    fn start(&mut self, tag: &str, attrs: Vec<RawAttr>, unary: bool, start: u32, end: u32);
    fn end(&mut self, tag: &str, start: u32, end: u32);
    /// Text run; positions are absent for raw-text element content.
    fn chars(&mut self, text: &str, range: Option<SourceRange>);
    fn comment(&mut self, text: &str, start: u32, end: u32);
    fn warn(&mut self, msg: std::string::String, range: Option<SourceRange>);
}

/// Scanner configuration
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub expect_html: bool,
    pub should_keep_comment: bool,
    pub should_decode_newlines: bool,
    pub should_decode_newlines_for_href: bool,
    pub is_unary_tag: fn(&str) -> bool,
    pub can_be_left_open_tag: fn(&str) -> bool,
    pub is_non_phrasing_tag: fn(&str) -> bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            expect_html: false,
            should_keep_comment: false,
            should_decode_newlines: false,
            should_decode_newlines_for_href: false,
            is_unary_tag: |_| false,
            can_be_left_open_tag: |_| false,
            is_non_phrasing_tag: sinopia_carton::is_non_phrasing_tag,
        }
    }
}

#[derive(Debug)]
struct OpenTag {
    tag: String,
    lower: String,
    start: u32,
    end: u32,
}

struct StartTagMatch {
    tag_name: String,
    attrs: Vec<(String, String, u32, u32)>,
    unary_slash: bool,
    start: u32,
    end: u32,
}

/// Decode the entities allowed inside attribute values.
pub fn decode_attr(value: &str, should_decode_newlines: bool) -> std::string::String {
    let re = if should_decode_newlines {
        &*ENCODED_ATTR_WITH_NEWLINES
    } else {
        &*ENCODED_ATTR
    };
    re.replace_all(value, |caps: &regex::Captures| match &caps[0] {
        "&lt;" => "<",
        "&gt;" => ">",
        "&quot;" => "\"",
        "&amp;" => "&",
        "&#10;" => "\n",
        "&#9;" => "\t",
        _ => "'",
    })
    .into_owned()
}

/// Scan `source`, reporting structure to `handler`.
pub fn parse_html<H: HtmlHandler>(source: &str, options: ScanOptions, handler: &mut H) {
    let mut scanner = Scanner {
        source,
        index: 0,
        stack: Vec::new(),
        last_tag: None,
        options,
        plain_text_res: FxHashMap::default(),
    };
    scanner.run(handler);
}

struct Scanner<'s> {
    source: &'s str,
    index: usize,
    stack: Vec<OpenTag>,
    last_tag: Option<String>,
    options: ScanOptions,
    plain_text_res: FxHashMap<String, Regex>,
}

impl<'s> Scanner<'s> {
    #[inline]
    fn rest(&self) -> &'s str {
        &self.source[self.index..]
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        self.index += n;
    }

    #[inline]
    fn pos(&self) -> u32 {
        self.index as u32
    }

    fn run<H: HtmlHandler>(&mut self, handler: &mut H) {
        while self.index < self.source.len() {
            let last = self.index;
            let in_plain_text = self
                .last_tag
                .as_deref()
                .is_some_and(is_plain_text_element);

            if !in_plain_text {
                let mut html = self.rest();
                let text_end = html.find('<');
                if text_end == Some(0) {
                    if html.starts_with(COMMENT_OPEN) {
                        if let Some(comment_end) = html.find("-->") {
                            if self.options.should_keep_comment {
                                let (a, b) = (comment_end.min(4), comment_end.max(4));
                                let start = self.pos();
                                handler.comment(
                                    &html[a..b],
                                    start,
                                    start + comment_end as u32 + 3,
                                );
                            }
                            self.advance(comment_end + 3);
                            continue;
                        }
                    }

                    if html.starts_with(CONDITIONAL_COMMENT_OPEN) {
                        if let Some(conditional_end) = html.find("]>") {
                            self.advance(conditional_end + 2);
                            continue;
                        }
                    }

                    if let Some(doctype) = DOCTYPE.find(html) {
                        self.advance(doctype.end());
                        continue;
                    }

                    if let Some(caps) = END_TAG.captures(html) {
                        let start = self.pos();
                        self.advance(caps[0].len());
                        let tag = String::from(&caps[1]);
                        let end = self.pos();
                        self.parse_end_tag(handler, Some(tag.as_str()), start, end);
                        continue;
                    }

                    if let Some(start_tag) = self.parse_start_tag() {
                        let ignore_newline = is_ignore_newline_tag(&start_tag.tag_name);
                        self.handle_start_tag(handler, start_tag);
                        if ignore_newline && self.rest().starts_with('\n') {
                            self.advance(1);
                        }
                        continue;
                    }
                    // A failed start tag may already have consumed input.
                    html = self.rest();
                }

                let text = match text_end {
                    Some(mut end) => {
                        let mut rest = &html[end..];
                        while !END_TAG.is_match(rest)
                            && !START_TAG_OPEN.is_match(rest)
                            && !rest.starts_with(COMMENT_OPEN)
                            && !rest.starts_with(CONDITIONAL_COMMENT_OPEN)
                        {
                            // `<` in plain text: be forgiving and treat it as text
                            match rest.get(1..).and_then(|r| r.find('<')) {
                                Some(next) => {
                                    end += next + 1;
                                    rest = &html[end..];
                                }
                                None => break,
                            }
                        }
                        &html[..end]
                    }
                    None => html,
                };

                if !text.is_empty() {
                    let start = self.pos();
                    self.advance(text.len());
                    handler.chars(text, Some(SourceRange::new(start, self.pos())));
                }
            } else {
                self.scan_plain_text(handler);
            }

            if self.index == last {
                let html = self.rest();
                handler.chars(html, None);
                if self.stack.is_empty() {
                    handler.warn(
                        format!("Mal-formatted tag at end of template: \"{}\"", html),
                        Some(SourceRange::at(self.source.len() as u32)),
                    );
                }
                break;
            }
        }

        // Clean up any remaining tags
        let pos = self.pos();
        self.parse_end_tag(handler, None, pos, pos);
    }

    /// Consume raw content of `<script>`, `<style>` or `<textarea>` up to its end tag.
    fn scan_plain_text<H: HtmlHandler>(&mut self, handler: &mut H) {
        let stacked = match &self.last_tag {
            Some(tag) => String::from(tag.to_lowercase()),
            None => return,
        };
        let re = self
            .plain_text_res
            .entry(stacked.clone())
            .or_insert_with(|| {
                Regex::new(&format!(r"(?i)^([\s\S]*?)(</{}[^>]*>)", regex::escape(&stacked)))
                    .unwrap_or_else(|_| Regex::new(r"[^\s\S]").unwrap())
            })
            .clone();

        let html = self.rest();
        let mut end_tag_length = 0;
        if let Some(caps) = re.captures(html) {
            let mut text = caps.get(1).map_or("", |m| m.as_str());
            end_tag_length = caps[2].len();
            if is_ignore_newline_tag(&stacked) && text.starts_with('\n') {
                text = &text[1..];
            }
            handler.chars(text, None);
            self.advance(caps[0].len());
        }
        let end = self.pos();
        self.parse_end_tag(handler, Some(stacked.as_str()), end - end_tag_length as u32, end);
    }

    fn parse_start_tag(&mut self) -> Option<StartTagMatch> {
        let caps = START_TAG_OPEN.captures(self.rest())?;
        let mut matched = StartTagMatch {
            tag_name: String::from(&caps[1]),
            attrs: Vec::new(),
            unary_slash: false,
            start: self.pos(),
            end: 0,
        };
        self.advance(caps[0].len());

        loop {
            let html = self.rest();
            if let Some(end) = START_TAG_CLOSE.captures(html) {
                matched.unary_slash = !end[1].is_empty();
                self.advance(end[0].len());
                matched.end = self.pos();
                return Some(matched);
            }
            let attr = DYNAMIC_ARG_ATTRIBUTE
                .captures(html)
                .or_else(|| ATTRIBUTE.captures(html))?;
            let whole = &attr[0];
            let leading = whole.len() - whole.trim_start().len();
            let start = self.pos() + leading as u32;
            let name = String::from(&attr[1]);
            let value = attr
                .get(3)
                .or_else(|| attr.get(4))
                .or_else(|| attr.get(5))
                .map_or("", |m| m.as_str());
            let value = String::from(value);
            self.advance(whole.len());
            matched.attrs.push((name, value, start, self.pos()));
        }
    }

    fn handle_start_tag<H: HtmlHandler>(&mut self, handler: &mut H, matched: StartTagMatch) {
        let tag_name = matched.tag_name;
        if self.options.expect_html {
            let pos = self.pos();
            if self.last_tag.as_deref() == Some("p") && (self.options.is_non_phrasing_tag)(&tag_name)
            {
                self.parse_end_tag(handler, Some("p"), pos, pos);
            }
            if (self.options.can_be_left_open_tag)(&tag_name)
                && self.last_tag.as_deref() == Some(tag_name.as_str())
            {
                self.parse_end_tag(handler, Some(tag_name.as_str()), pos, pos);
            }
        }

        let unary = (self.options.is_unary_tag)(&tag_name) || matched.unary_slash;

        let attrs: Vec<RawAttr> = matched
            .attrs
            .into_iter()
            .map(|(name, value, start, end)| {
                let decode_newlines = if tag_name.as_str() == "a" && name.as_str() == "href" {
                    self.options.should_decode_newlines_for_href
                } else {
                    self.options.should_decode_newlines
                };
                RawAttr {
                    value: decode_attr(&value, decode_newlines).into(),
                    name,
                    range: SourceRange::new(start, end),
                }
            })
            .collect();

        if !unary {
            self.stack.push(OpenTag {
                lower: tag_name.to_lowercase().into(),
                tag: tag_name.clone(),
                start: matched.start,
                end: matched.end,
            });
            self.last_tag = Some(tag_name.clone());
        }

        handler.start(&tag_name, attrs, unary, matched.start, matched.end);
    }

    fn parse_end_tag<H: HtmlHandler>(
        &mut self,
        handler: &mut H,
        tag_name: Option<&str>,
        start: u32,
        end: u32,
    ) {
        let lower = tag_name.map(|t| t.to_lowercase());
        // Find the closest opened tag of the same type
        let pos = match &lower {
            Some(lower) => self.stack.iter().rposition(|t| t.lower.as_str() == lower),
            None => Some(0),
        };

        match pos {
            Some(pos) => {
                // Close all the open elements, up the stack
                for i in (pos..self.stack.len()).rev() {
                    let open = &self.stack[i];
                    if i > pos || tag_name.is_none() {
                        handler.warn(
                            format!("tag <{}> has no matching end tag.", open.tag),
                            Some(SourceRange::new(open.start, open.end)),
                        );
                    }
                    let tag = open.tag.clone();
                    handler.end(&tag, start, end);
                }
                self.stack.truncate(pos);
                self.last_tag = self.stack.last().map(|t| t.tag.clone());
            }
            None => match lower.as_deref() {
                Some("br") => {
                    handler.start(tag_name.unwrap_or("br"), Vec::new(), true, start, end);
                }
                Some("p") => {
                    let tag = tag_name.unwrap_or("p");
                    handler.start(tag, Vec::new(), false, start, end);
                    handler.end(tag, start, end);
                }
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<std::string::String>,
        warnings: Vec<std::string::String>,
    }

    impl HtmlHandler for Recorder {
        fn start(&mut self, tag: &str, attrs: Vec<RawAttr>, unary: bool, _: u32, _: u32) {
            let attrs: Vec<_> = attrs
                .iter()
                .map(|a| format!("{}={}", a.name, a.value))
                .collect();
            self.events.push(format!(
                "start {} [{}]{}",
                tag,
                attrs.join(" "),
                if unary { " /" } else { "" }
            ));
        }

        fn end(&mut self, tag: &str, _: u32, _: u32) {
            self.events.push(format!("end {}", tag));
        }

        fn chars(&mut self, text: &str, _: Option<SourceRange>) {
            self.events.push(format!("text {:?}", text));
        }

        fn comment(&mut self, text: &str, _: u32, _: u32) {
            self.events.push(format!("comment {:?}", text));
        }

        fn warn(&mut self, msg: std::string::String, _: Option<SourceRange>) {
            self.warnings.push(msg);
        }
    }

    fn scan(source: &str, options: ScanOptions) -> Recorder {
        let mut recorder = Recorder::default();
        parse_html(source, options, &mut recorder);
        recorder
    }

    fn html_options() -> ScanOptions {
        ScanOptions {
            expect_html: true,
            is_unary_tag: sinopia_carton::is_unary_tag,
            can_be_left_open_tag: sinopia_carton::can_be_left_open_tag,
            ..Default::default()
        }
    }

    #[test]
    fn test_basic_structure() {
        let r = scan(r#"<div id="a" :b='c' d=e f>hi</div>"#, ScanOptions::default());
        assert_eq!(
            r.events,
            [
                "start div [id=a :b=c d=e f=]",
                "text \"hi\"",
                "end div",
            ]
        );
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_dynamic_argument_attribute() {
        let r = scan(r#"<a v-bind:[key]="v" @[ev].stop="h"></a>"#, ScanOptions::default());
        assert_eq!(r.events[0], "start a [v-bind:[key]=v @[ev].stop=h]");
    }

    #[test]
    fn test_paragraph_closed_by_block() {
        let r = scan("<p>a<div></div>", html_options());
        insta::assert_snapshot!(r.events.join("\n"), @r#"
        start p []
        text "a"
        end p
        start div []
        end div
        "#);
    }

    #[test]
    fn test_stray_br_and_p_end_tags() {
        let r = scan("<div></br></p></div>", html_options());
        insta::assert_snapshot!(r.events.join("\n"), @r"
        start div []
        start br [] /
        start p []
        end p
        end div
        ");
    }

    #[test]
    fn test_unclosed_tags_warn() {
        let r = scan("<div><span></div>", ScanOptions::default());
        assert_eq!(r.events, ["start div []", "start span []", "end span", "end div"]);
        assert_eq!(r.warnings, ["tag <span> has no matching end tag."]);
    }

    #[test]
    fn test_stray_lt_is_text() {
        let r = scan("<div>a < b</div>", ScanOptions::default());
        assert_eq!(r.events[1], "text \"a < b\"");
    }

    #[test]
    fn test_comments_and_doctype() {
        let options = ScanOptions {
            should_keep_comment: true,
            ..Default::default()
        };
        let r = scan("<!DOCTYPE html><!-- hi --><![if IE]><div></div>", options);
        assert_eq!(r.events, ["comment \" hi \"", "start div []", "end div"]);
    }

    #[test]
    fn test_plain_text_element() {
        let r = scan("<textarea>\n<b>x</b></textarea>", ScanOptions::default());
        assert_eq!(
            r.events,
            ["start textarea []", "text \"<b>x</b>\"", "end textarea"]
        );
    }

    #[test]
    fn test_decode_attr() {
        assert_eq!(decode_attr("&lt;a&gt; &amp; &#39;&#10;", false), "<a> & '&#10;");
        assert_eq!(decode_attr("a&#10;b", true), "a\nb");
    }
}
