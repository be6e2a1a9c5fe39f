//! The final emitted artifact (spec §6.6) and the simple minifiers the
//! merger applies before writing it out.

pub mod source_map;

pub use source_map::{SourceMap, SourceMapGenerator};

/// What the merger hands back: a primary HTML document plus whatever
/// sidecar files `MergeOptions` chose to split out (spec §4.9, §6.6).
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    pub html: String,
    pub css_file: Option<String>,
    pub js_file: Option<String>,
    pub html_source_map: Option<SourceMap>,
    pub css_source_map: Option<SourceMap>,
    pub js_source_map: Option<SourceMap>,
}

/// Collapses runs of whitespace between tags and trims each line; not a
/// full HTML minifier, just enough to shrink generator output meaningfully
/// without touching text-node content.
pub fn minify_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_tag = false;
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                in_tag = true;
                out.push(c);
            }
            '>' => {
                in_tag = false;
                out.push(c);
            }
            c if c.is_whitespace() && in_tag => {
                while matches!(chars.peek(), Some(n) if n.is_whitespace()) {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' | '\r' if !in_tag => {}
            c => out.push(c),
        }
    }
    out
}

/// Strips comments and collapses whitespace; preserves string literals.
pub fn minify_css(input: &str) -> String {
    let stripped = strip_c_comments(input);
    collapse_whitespace(&stripped)
}

/// Same whitespace/comment collapsing as [`minify_css`]; this isn't a real
/// JS parser so it only strips `/* ... */` blocks, never `//` (which could
/// be inside a regex literal or URL).
pub fn minify_js(input: &str) -> String {
    let stripped = strip_block_comments(input);
    collapse_whitespace(&stripped)
}

fn strip_c_comments(input: &str) -> String {
    strip_block_comments(input)
}

fn strip_block_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut prev = '\0';
            for n in chars.by_ref() {
                if prev == '*' && n == '/' {
                    break;
                }
                prev = n;
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_css_strips_comments_and_collapses_whitespace() {
        let css = "div {\n  /* note */ color:  red;\n}\n";
        assert_eq!(minify_css(css), "div { color: red; }");
    }

    #[test]
    fn minify_html_collapses_tag_whitespace_only() {
        let html = "<div   id=\"a\">\n  text  \n</div>";
        assert_eq!(minify_html(html), "<div id=\"a\">  text  </div>");
    }
}
