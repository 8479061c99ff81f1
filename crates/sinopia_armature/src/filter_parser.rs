//! Filter syntax: `value | filterA | filterB(arg)`.
//!
//! A `|` only separates filters outside strings, template literals, regex
//! literals and brackets, and never as part of `||`.

use once_cell::sync::Lazy;
use regex::Regex;

static VALID_DIVISION_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\w).+\-_$\]]").unwrap());

/// Rewrite filters into `_f("name")(exp, args)` calls.
pub fn parse_filters(exp: &str) -> std::string::String {
    let bytes = exp.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut in_template = false;
    let mut in_regex = false;
    let mut curly = 0i32;
    let mut square = 0i32;
    let mut paren = 0i32;
    let mut last_filter_index = 0usize;
    let mut expression: Option<&str> = None;
    let mut filters: Vec<&str> = Vec::new();
    let mut prev = 0u8;

    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if in_single {
            if c == b'\'' && prev != b'\\' {
                in_single = false;
            }
        } else if in_double {
            if c == b'"' && prev != b'\\' {
                in_double = false;
            }
        } else if in_template {
            if c == b'`' && prev != b'\\' {
                in_template = false;
            }
        } else if in_regex {
            if c == b'/' && prev != b'\\' {
                in_regex = false;
            }
        } else if c == b'|'
            && bytes.get(i + 1) != Some(&b'|')
            && (i == 0 || bytes[i - 1] != b'|')
            && curly == 0
            && square == 0
            && paren == 0
        {
            match expression {
                // first filter, end of expression
                None => {
                    last_filter_index = i + 1;
                    expression = Some(exp[..i].trim());
                }
                Some(_) => {
                    filters.push(exp[last_filter_index..i].trim());
                    last_filter_index = i + 1;
                }
            }
        } else {
            match c {
                b'"' => in_double = true,
                b'\'' => in_single = true,
                b'`' => in_template = true,
                b'(' => paren += 1,
                b')' => paren -= 1,
                b'[' => square += 1,
                b']' => square -= 1,
                b'{' => curly += 1,
                b'}' => curly -= 1,
                _ => {}
            }
            if c == b'/' {
                // find first non-whitespace prev char
                let p = exp[..i].trim_end_matches(' ').chars().next_back();
                let division = p.is_some_and(|p| {
                    let mut buf = [0u8; 4];
                    VALID_DIVISION_CHAR.is_match(p.encode_utf8(&mut buf))
                });
                if !division {
                    in_regex = true;
                }
            }
        }
        prev = c;
        i += 1;
    }

    let mut result = match expression {
        None => return exp.trim().to_owned(),
        Some(expression) => {
            if last_filter_index != 0 {
                filters.push(exp[last_filter_index..].trim());
            }
            expression.to_owned()
        }
    };
    for filter in filters {
        result = wrap_filter(&result, filter);
    }
    result
}

fn wrap_filter(exp: &str, filter: &str) -> std::string::String {
    match filter.find('(') {
        None => format!("_f(\"{}\")({})", filter, exp),
        Some(i) => {
            let name = &filter[..i];
            let args = &filter[i + 1..];
            if args == ")" {
                format!("_f(\"{}\")({}{}", name, exp, args)
            } else {
                format!("_f(\"{}\")({},{}", name, exp, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters() {
        assert_eq!(parse_filters(" a || b "), "a || b");
    }

    #[test]
    fn test_chained_filters_with_args() {
        assert_eq!(
            parse_filters("msg | capitalize | truncate(10, '...')"),
            r#"_f("truncate")(_f("capitalize")(msg),10, '...')"#
        );
        assert_eq!(parse_filters("msg | f()"), r#"_f("f")(msg)"#);
    }

    #[test]
    fn test_pipes_inside_literals_are_kept() {
        assert_eq!(parse_filters("'a|b' + c"), "'a|b' + c");
        assert_eq!(parse_filters("fn(a | b)"), "fn(a | b)");
        assert_eq!(parse_filters("/a|b/.test(c)"), "/a|b/.test(c)");
    }

    #[test]
    fn test_division_is_not_regex() {
        assert_eq!(parse_filters("a / b | f"), r#"_f("f")(a / b)"#);
    }
}
