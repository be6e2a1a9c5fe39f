//! The unified scanner (spec §3.1, §4.1): one left-to-right pass over the
//! source file that splits it into [`Fragment`]s, tracking brace nesting and
//! skipping over string literals and comments so their delimiters never
//! count toward that nesting.

use super::fragment::{Fragment, FragmentKind, OriginKind, PlaceholderTable};
use crate::chars;
use crate::error::{CompileError, Result};
use crate::parse_util::{Position, SourceFile, Span};
use std::rc::Rc;

/// What kind of brace-delimited construct is currently open. Only the
/// distinction the scanner needs to decide the local/global `style`
/// question (SPEC_FULL §12) is tracked; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Element,
    /// A local `style { ... }` body. CSS selectors inside it may start with
    /// `#`, so the generator-comment reading of a leading `#` is suppressed
    /// while any such context is open (see `style_depth`).
    Style,
    Other,
}

pub struct Scanner {
    file: Rc<SourceFile>,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    stack: Vec<Context>,
    /// Count of open `Context::Style` frames, checked before reading a
    /// leading `#` as a generator comment rather than a CSS id selector.
    style_depth: usize,
    fragments: Vec<Fragment>,
    placeholders: PlaceholderTable,
    /// Byte offset where the current (accumulating) CHTL fragment began.
    chtl_start: Position,
}

/// Scan `content` (from file `url`) into an ordered list of fragments plus
/// the placeholder side table for any `[Origin]` bodies found along the way.
pub fn scan(content: &str, url: impl Into<String>) -> Result<(Vec<Fragment>, PlaceholderTable)> {
    let file = Rc::new(SourceFile::new(content, url));
    let mut scanner = Scanner::new(file);
    scanner.run()?;
    Ok((scanner.fragments, scanner.placeholders))
}

impl Scanner {
    fn new(file: Rc<SourceFile>) -> Scanner {
        let chars: Vec<char> = file.content.chars().collect();
        let start = Position::start_of(file.clone());
        Scanner {
            file,
            chars,
            pos: 0,
            line: 0,
            col: 0,
            stack: Vec::new(),
            style_depth: 0,
            fragments: Vec::new(),
            placeholders: PlaceholderTable::new(),
            chtl_start: start,
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or(chars::EOF)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.chars.get(self.pos + offset).copied().unwrap_or(chars::EOF)
    }

    fn position(&self) -> Position {
        Position::new(self.file.clone(), self.byte_offset(), self.line, self.col)
    }

    /// Byte offset of `self.pos` (a char index) into the underlying UTF-8
    /// source text, needed because `Span`/`Position` are byte-addressed.
    fn byte_offset(&self) -> usize {
        self.chars[..self.pos].iter().map(|c| c.len_utf8()).sum()
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.pos += 1;
        if c == chars::LF {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        c
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == c)
    }

    fn run(&mut self) -> Result<()> {
        while !self.eof() {
            if self.skip_comment_or_string()? {
                continue;
            }
            // A leading `#` reads as a generator comment to end of line only
            // in the top-level CHTL stream, and only outside a local style
            // body (where it's an id selector instead). Verbatim CSS/JS/
            // Origin bodies never get this treatment — see
            // `scan_verbatim_block`, which tracks braces/strings/comments
            // only and must never swallow a `{{#id}}` CHTL-JS selector or a
            // `#id { ... }` rule inside a global `style{}` as a comment.
            if self.style_depth == 0 && self.peek() == '#' {
                self.skip_generator_comment();
                continue;
            }
            match self.peek() {
                c if chars::is_ident_start(c) || c == chars::LBRACKET || c == chars::AT => {
                    self.scan_keyword_or_identifier()?;
                }
                chars::LBRACE => {
                    self.stack.push(Context::Other);
                    self.advance();
                }
                chars::RBRACE => {
                    if let Some(Context::Style) = self.stack.pop() {
                        self.style_depth -= 1;
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.flush_chtl(self.position());
        Ok(())
    }

    /// Skip a string literal or a `//`/`/* */` comment if one starts here,
    /// honouring escapes, and return `true` if it did (so the caller
    /// re-checks `eof`). Delimiters found here never affect the
    /// brace-nesting stack (spec §3.1's escape rule). Deliberately does not
    /// special-case a leading `#` as a generator comment — that's a
    /// CHTL-stream-only rule (see `run`'s own check), not something a
    /// verbatim CSS/JS/Origin body should ever apply, since both
    /// `scan_verbatim_block` and `run` call this to skip delimiters while
    /// only `run` walks the actual CHTL grammar.
    fn skip_comment_or_string(&mut self) -> Result<bool> {
        match self.peek() {
            chars::DQ | chars::SQ => {
                self.skip_string(self.peek())?;
                Ok(true)
            }
            chars::SLASH if self.peek_at(1) == chars::SLASH => {
                while !self.eof() && self.peek() != chars::LF {
                    self.advance();
                }
                Ok(true)
            }
            chars::SLASH if self.peek_at(1) == '*' => {
                let start = self.position();
                self.advance();
                self.advance();
                loop {
                    if self.eof() {
                        return Err(CompileError::syntax(
                            "unterminated-comment",
                            "unterminated block comment",
                            Some(Span::new(start, self.position())),
                        ));
                    }
                    if self.peek() == '*' && self.peek_at(1) == chars::SLASH {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Consumes a `#`-led generator comment to end of line. Only valid to
    /// call from the top-level CHTL stream (see `run`).
    fn skip_generator_comment(&mut self) {
        while !self.eof() && self.peek() != chars::LF {
            self.advance();
        }
    }

    fn skip_string(&mut self, quote: char) -> Result<()> {
        let start = self.position();
        self.advance();
        loop {
            if self.eof() {
                return Err(CompileError::syntax(
                    "unterminated-string",
                    "unterminated string literal",
                    Some(Span::new(start, self.position())),
                ));
            }
            match self.peek() {
                chars::BACKSLASH => {
                    self.advance();
                    if !self.eof() {
                        self.advance();
                    }
                }
                c if c == quote => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Reads a bare identifier, bracket-keyword (`[Origin]`, `[Template]`,
    /// ...), or at-keyword (`@Style`, `@Html`, ...) and, if it introduces a
    /// brace-delimited construct, decides whether that construct is scanned
    /// out as its own fragment or stays part of the ongoing CHTL fragment.
    fn scan_keyword_or_identifier(&mut self) -> Result<()> {
        let word_start = self.pos;
        if self.peek() == chars::LBRACKET {
            self.advance();
            while !self.eof() && self.peek() != chars::RBRACKET {
                self.advance();
            }
            if !self.eof() {
                self.advance();
            }
        } else {
            if self.peek() == chars::AT {
                self.advance();
            }
            while chars::is_ident_continue(self.peek()) {
                self.advance();
            }
        }
        let word: String = self.chars[word_start..self.pos].iter().collect();
        let bare = word.trim_start_matches('[').trim_end_matches(']');

        self.skip_inline_whitespace();

        if bare.eq_ignore_ascii_case("Origin") || word == "[Origin]" {
            self.scan_origin_block()?;
            return Ok(());
        }

        if self.peek() != chars::LBRACE {
            return Ok(());
        }

        match bare {
            "style" => {
                let top_is_element = matches!(self.stack.last(), Some(Context::Element));
                if top_is_element {
                    self.stack.push(Context::Style);
                    self.style_depth += 1;
                    self.advance();
                } else {
                    self.scan_verbatim_block(FragmentKind::Css, None, "")?;
                }
            }
            "script" => {
                self.scan_verbatim_block(FragmentKind::ChtlJs, None, "")?;
            }
            _ => {
                let is_bracket_word = word.starts_with(chars::LBRACKET);
                self.stack.push(if is_bracket_word { Context::Other } else { Context::Element });
                self.advance();
            }
        }
        Ok(())
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), chars::SPACE | chars::TAB) {
            self.advance();
        }
    }

    /// `[Origin] @Kind optional_name { ... }` or the bodyless re-emission
    /// form `[Origin] @Kind optional_name;` (no fragment to extract).
    fn scan_origin_block(&mut self) -> Result<()> {
        let mut kind = OriginKind::Custom(String::new());
        if self.peek() == chars::AT {
            let start = self.pos;
            self.advance();
            while chars::is_ident_continue(self.peek()) {
                self.advance();
            }
            let name: String = self.chars[start + 1..self.pos].iter().collect();
            kind = match name.as_str() {
                "Html" => OriginKind::Html,
                "Style" | "Css" => OriginKind::Css,
                "JavaScript" | "Js" => OriginKind::JavaScript,
                other => OriginKind::Custom(other.to_string()),
            };
        }
        self.skip_inline_whitespace();
        let name_start = self.pos;
        while chars::is_ident_continue(self.peek()) {
            self.advance();
        }
        let origin_name: String = self.chars[name_start..self.pos].iter().collect();
        self.skip_inline_whitespace();
        if self.peek() == chars::LBRACE {
            self.scan_verbatim_block(FragmentKind::Literal(kind), None, &origin_name)?;
        }
        Ok(())
    }

    /// Extracts the body between a `{` (not yet consumed) and its matching
    /// `}` as one opaque fragment, flushing the pending CHTL fragment first
    /// and starting a new one right after the closing brace. The braces
    /// themselves stay in the surrounding CHTL fragments so the parser can
    /// still see the construct that introduced them.
    fn scan_verbatim_block(&mut self, kind: FragmentKind, placeholder_text: Option<&str>, origin_name: &str) -> Result<()> {
        let open_pos = self.position();
        self.advance(); // consume '{'
        let body_start = self.position();
        // Flush the CHTL fragment *including* the `{` we just consumed, so
        // the opening brace stays with the construct that introduced it
        // rather than vanishing from every fragment's text.
        self.flush_chtl(body_start.clone());
        let mut depth = 1usize;
        loop {
            if self.eof() {
                return Err(CompileError::syntax(
                    "unterminated-block",
                    "unterminated block",
                    Some(Span::new(open_pos, self.position())),
                ));
            }
            if self.skip_comment_or_string()? {
                continue;
            }
            match self.peek() {
                chars::LBRACE => {
                    depth += 1;
                    self.advance();
                }
                chars::RBRACE => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
        let body_end = self.position();
        let span = Span::new(body_start, body_end);

        let mut fragment = Fragment::new(kind, span.clone());
        if matches!(fragment.kind, FragmentKind::Literal(_)) {
            let text = placeholder_text.unwrap_or_else(|| span.text());
            let id = self.placeholders.insert(text);
            fragment = fragment.with_placeholder(id);
            if !origin_name.is_empty() {
                fragment = fragment.with_origin_name(origin_name);
            }
        }
        self.fragments.push(fragment);

        // The closing `}` stays with the next CHTL fragment (mirrors the
        // opening `{` above) rather than being dropped between fragments.
        self.chtl_start = body_end;
        self.advance(); // consume '}'
        Ok(())
    }

    fn flush_chtl(&mut self, end: Position) {
        if end.offset > self.chtl_start.offset {
            let span = Span::new(self.chtl_start.clone(), end.clone());
            self.fragments.push(Fragment::new(FragmentKind::Chtl, span));
        }
        self.chtl_start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::fragment::FragmentKind;

    fn kinds(src: &str) -> Vec<FragmentKind> {
        let (fragments, _) = scan(src, "test.chtl").expect("scan should succeed");
        fragments.into_iter().map(|f| f.kind).collect()
    }

    #[test]
    fn covers_whole_source() {
        let src = "div { text { \"hi\" } }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }

    #[test]
    fn global_style_is_extracted_as_css() {
        let src = "style { .a { color: red; } } div { }";
        let ks = kinds(src);
        assert!(ks.iter().any(|k| matches!(k, FragmentKind::Css)));
    }

    #[test]
    fn verbatim_block_braces_survive_reconstruction() {
        let src = "style { .a { color: red; } } div { script { x(); } }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }

    #[test]
    fn origin_block_braces_survive_reconstruction() {
        let src = "[Origin] @Html { <b>raw</b> } div { }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }

    #[test]
    fn local_style_stays_in_chtl_stream() {
        let src = "div { style { color: red; } }";
        let ks = kinds(src);
        assert!(!ks.iter().any(|k| matches!(k, FragmentKind::Css)));
        assert!(ks.iter().all(|k| matches!(k, FragmentKind::Chtl)));
    }

    #[test]
    fn script_is_always_extracted() {
        let src = "div { script { console.log(1); } }";
        let ks = kinds(src);
        assert!(ks.iter().any(|k| matches!(k, FragmentKind::ChtlJs)));
    }

    #[test]
    fn origin_block_is_literal_and_placeholder_backed() {
        let src = "[Origin] @Html { <b>raw</b> }";
        let (fragments, table) = scan(src, "test.chtl").unwrap();
        let lit = fragments
            .iter()
            .find(|f| matches!(f.kind, FragmentKind::Literal(_)))
            .expect("literal fragment");
        let id = lit.placeholder.expect("placeholder id");
        assert_eq!(table.get(id).trim(), "<b>raw</b>");
    }

    #[test]
    fn comment_delimiters_do_not_affect_nesting() {
        let src = "div { /* } */ text { \"a\" } }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let result = scan("text { \"unterminated }", "test.chtl");
        assert!(result.is_err());
    }

    #[test]
    fn id_selector_inside_local_style_does_not_desync_braces() {
        let src = "div { style { #box { color: red; } } }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }

    #[test]
    fn generator_comment_outside_style_is_skipped() {
        let src = "# a note\ndiv { }";
        let (fragments, _) = scan(src, "test.chtl").unwrap();
        let reconstructed: String = fragments.iter().map(|f| f.text()).collect();
        assert_eq!(reconstructed, src);
    }
}
