//! The fixed HTML5 facts the generator needs (spec §4.6): which tags are
//! void elements (self-closing, never take children) and which hold raw,
//! unescaped text content. Trimmed down from the retrieved compiler's much
//! larger `ml_parser::html_tags` tag-definition table, which also modelled
//! namespace inheritance and content types this generator doesn't need.

/// Tags that the generator always emits as `<tag ... />` and never gives
/// children, per the HTML5 void element list.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Tags whose text content is not HTML-escaped by the generator.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_raw_text_element(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// HTML-escape text content: `&`, `<`, `>`, `"` are replaced with entities.
/// `"` is escaped too since the same routine is reused for attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_void_elements_case_insensitively() {
        assert!(is_void_element("br"));
        assert!(is_void_element("BR"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn escapes_reserved_html_characters() {
        assert_eq!(escape_html("<a href=\"x\">&b</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;b&lt;/a&gt;");
    }
}
