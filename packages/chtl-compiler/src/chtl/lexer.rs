//! The CHTL lexer (spec §4.2): turns one CHTL fragment's text into a token
//! stream. Keyword recognition is indirected through the active
//! `Configuration`'s `KEYWORD_*` rebindings, read up front so the lexer
//! never has to re-query the symbol table mid-scan.

use super::token::{Token, TokenKind};
use crate::chars;
use crate::config::Configuration;
use crate::error::{CompileError, Result};
use crate::parse_util::{Position, SourceFile, Span};
use std::rc::Rc;

/// Units a number token may carry directly (spec §4.2: "trailing unit
/// captured as part of the token when followed directly by a known unit
/// suffix"). Kept narrow and CSS-flavoured since that's the only place
/// CHTL numbers carry units.
const KNOWN_UNITS: &[&str] = &[
    "px", "em", "rem", "vh", "vw", "vmin", "vmax", "pt", "pc", "in", "cm", "mm", "ex", "ch", "fr",
    "deg", "rad", "turn", "s", "ms", "%",
];

pub struct Lexer<'a> {
    file: Rc<SourceFile>,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    config: &'a Configuration,
}

pub fn lex(content: &str, url: impl Into<String>, config: &Configuration) -> Result<Vec<Token>> {
    let file = Rc::new(SourceFile::new(content, url));
    let mut lexer = Lexer {
        chars: file.content.chars().collect(),
        file,
        pos: 0,
        line: 0,
        col: 0,
        config,
    };
    lexer.run()
}

impl<'a> Lexer<'a> {
    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or(chars::EOF)
    }

    fn peek_at(&self, n: usize) -> char {
        self.chars.get(self.pos + n).copied().unwrap_or(chars::EOF)
    }

    fn position(&self) -> Position {
        Position::new(self.file.clone(), self.byte_offset(), self.line, self.col)
    }

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

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn run(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_inline_whitespace();
            if self.eof() {
                let pos = self.position();
                tokens.push(Token::new(TokenKind::Eof, Span::new(pos.clone(), pos)));
                break;
            }
            tokens.push(self.next_token()?);
        }
        Ok(tokens)
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\r' | '\n') {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let start = self.position();
        let c = self.peek();
        match c {
            '"' | '\'' => self.lex_string(c, start),
            // `#` immediately followed by an identifier char is an id
            // selector/property-ref prefix (`#box`); `#` followed by
            // whitespace or anything else opens a generator comment that
            // runs to end of line (spec §4.2, SPEC_FULL §11.1).
            '#' if chars::is_ident_start(self.peek_at(1)) => {
                self.advance();
                Ok(Token::new(TokenKind::Hash, start.clone().to(&self.position())))
            }
            '#' => self.lex_generator_comment(start),
            '/' if self.peek_at(1) == '/' => self.lex_line_comment(start),
            '/' if self.peek_at(1) == '*' => self.lex_block_comment(start),
            '[' => self.lex_bracket_keyword(start),
            '@' => self.lex_at_keyword(start),
            c if chars::is_digit(c) || (c == '-' && chars::is_digit(self.peek_at(1))) => {
                self.lex_number(start)
            }
            c if chars::is_ident_start(c) => self.lex_identifier_or_unquoted(start),
            '{' => self.single(TokenKind::LBrace, start),
            '}' => self.single(TokenKind::RBrace, start),
            ']' => self.single(TokenKind::RBracket, start),
            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            ';' => self.single(TokenKind::Semicolon, start),
            ',' => self.single(TokenKind::Comma, start),
            '&' => self.single(TokenKind::Ampersand, start),
            '|' => self.single(TokenKind::Pipe, start),
            '?' => self.single(TokenKind::Question, start),
            '!' => self.single(TokenKind::Bang, start),
            '_' => self.single(TokenKind::Underscore, start),
            '+' => self.single(TokenKind::Plus, start),
            '*' => self.single(TokenKind::Star, start),
            '/' => self.single(TokenKind::Slash, start),
            '-' if self.peek_at(1) == '>' => {
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::Arrow, start.to(&self.position())))
            }
            '-' => self.single(TokenKind::Minus, start),
            ':' if self.peek_at(1) == ':' => {
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::DoubleColon, start.to(&self.position())))
            }
            ':' => self.single(TokenKind::Colon, start),
            '=' => self.single(TokenKind::Equals, start),
            '.' if self.peek_at(1) == '.' && self.peek_at(2) == '.' => {
                self.advance();
                self.advance();
                self.advance();
                Ok(Token::new(TokenKind::Ellipsis, start.to(&self.position())))
            }
            '.' => self.single(TokenKind::Period, start),
            other => Err(CompileError::syntax(
                "unexpected-character",
                format!("unexpected character `{other}`"),
                Some(Span::new(start.clone(), start)),
            )),
        }
    }

    fn single(&mut self, kind: TokenKind, start: Position) -> Result<Token> {
        self.advance();
        Ok(Token::new(kind, start.to(&self.position())))
    }

    fn lex_generator_comment(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let text_start = self.pos;
        while !self.eof() && self.peek() != chars::LF {
            self.advance();
        }
        let text = self.slice(text_start, self.pos).trim().to_string();
        Ok(Token::new(TokenKind::GeneratorComment(text), start.to(&self.position())))
    }

    fn lex_line_comment(&mut self, start: Position) -> Result<Token> {
        self.advance();
        self.advance();
        let text_start = self.pos;
        while !self.eof() && self.peek() != chars::LF {
            self.advance();
        }
        let text = self.slice(text_start, self.pos);
        Ok(Token::new(TokenKind::Comment(text), start.to(&self.position())))
    }

    fn lex_block_comment(&mut self, start: Position) -> Result<Token> {
        self.advance();
        self.advance();
        let text_start = self.pos;
        loop {
            if self.eof() {
                return Err(CompileError::syntax(
                    "unterminated-comment",
                    "unterminated block comment",
                    Some(Span::new(start, self.position())),
                ));
            }
            if self.peek() == '*' && self.peek_at(1) == '/' {
                break;
            }
            self.advance();
        }
        let text = self.slice(text_start, self.pos);
        self.advance();
        self.advance();
        Ok(Token::new(TokenKind::Comment(text), start.to(&self.position())))
    }

    fn lex_string(&mut self, quote: char, start: Position) -> Result<Token> {
        self.advance();
        let mut value = String::new();
        loop {
            if self.eof() {
                return Err(CompileError::syntax(
                    "unterminated-string",
                    "unterminated string literal",
                    Some(Span::new(start, self.position())),
                ));
            }
            match self.peek() {
                '\\' => {
                    self.advance();
                    let escaped = self.advance();
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        '\\' => '\\',
                        '"' => '"',
                        '\'' => '\'',
                        other => other,
                    });
                }
                c if c == quote => {
                    self.advance();
                    break;
                }
                c => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::String(value), start.to(&self.position())))
    }

    fn lex_bracket_keyword(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let text_start = self.pos;
        while !self.eof() && self.peek() != ']' {
            self.advance();
        }
        let name = self.slice(text_start, self.pos);
        if self.eof() {
            return Err(CompileError::syntax(
                "unterminated-bracket-keyword",
                "unterminated bracket keyword",
                Some(Span::new(start, self.position())),
            ));
        }
        self.advance();
        let canonical = self.canonicalize_keyword(&name);
        Ok(Token::new(TokenKind::BracketKeyword(canonical), start.to(&self.position())))
    }

    fn lex_at_keyword(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let text_start = self.pos;
        while chars::is_ident_continue(self.peek()) {
            self.advance();
        }
        let name = self.slice(text_start, self.pos);
        Ok(Token::new(TokenKind::AtKeyword(name), start.to(&self.position())))
    }

    fn lex_number(&mut self, start: Position) -> Result<Token> {
        let text_start = self.pos;
        if self.peek() == '-' {
            self.advance();
        }
        while chars::is_digit(self.peek()) {
            self.advance();
        }
        if self.peek() == '.' && chars::is_digit(self.peek_at(1)) {
            self.advance();
            while chars::is_digit(self.peek()) {
                self.advance();
            }
        }
        let number_text = self.slice(text_start, self.pos);
        let value: f64 = number_text.parse().map_err(|_| {
            CompileError::syntax(
                "invalid-number",
                format!("invalid number literal `{number_text}`"),
                Some(Span::new(start.clone(), self.position())),
            )
        })?;

        let unit_start = self.pos;
        let col_before_unit = self.col;
        if self.peek() == '%' {
            self.advance();
        } else {
            while self.peek().is_ascii_alphabetic() {
                self.advance();
            }
        }
        let unit_text = self.slice(unit_start, self.pos);
        let unit = if KNOWN_UNITS.iter().any(|u| u.eq_ignore_ascii_case(&unit_text)) {
            Some(unit_text)
        } else {
            // Not a recognised unit suffix: it belongs to the next token,
            // not this number (e.g. `10 auto` is two tokens). Unit chars are
            // never newlines, so rewinding `col` alongside `pos` is exact.
            self.pos = unit_start;
            self.col = col_before_unit;
            None
        };

        let full_text = self.slice(text_start, self.pos);
        Ok(Token::new(
            TokenKind::Number { text: full_text, value, unit },
            start.to(&self.position()),
        ))
    }

    fn lex_identifier_or_unquoted(&mut self, start: Position) -> Result<Token> {
        let text_start = self.pos;
        while chars::is_ident_continue(self.peek()) {
            self.advance();
        }
        let word = self.slice(text_start, self.pos);
        Ok(Token::new(TokenKind::Identifier(word), start.to(&self.position())))
    }

    /// Resolves a bracket-keyword body (`Template`, `Custom`, ...) through
    /// the active configuration's `KEYWORD_*` rebindings back to the
    /// canonical spelling the parser expects (spec §4.2).
    fn canonicalize_keyword(&self, raw: &str) -> String {
        for canonical in [
            "Template",
            "Custom",
            "Origin",
            "Import",
            "Namespace",
            "Configuration",
            "Info",
            "Export",
        ] {
            if self.config.keyword(canonical, canonical) == raw {
                return canonical.to_string();
            }
        }
        raw.to_string()
    }
}

/// Helper so `Position::to` reads naturally at call sites above (mirrors
/// `Span::to` but takes two positions directly).
trait PositionExt {
    fn to(&self, other: &Position) -> Span;
}

impl PositionExt for Position {
    fn to(&self, other: &Position) -> Span {
        Span::new(self.clone(), other.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let cfg = Configuration::default();
        lex(src, "t.chtl", &cfg).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_element_skeleton() {
        let ks = tokens("div { }");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier("div".into()),
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_number_with_unit() {
        let ks = tokens("16px");
        assert_eq!(
            ks[0],
            TokenKind::Number { text: "16px".into(), value: 16.0, unit: Some("px".into()) }
        );
    }

    #[test]
    fn lexes_number_without_known_unit_suffix() {
        let ks = tokens("10 auto");
        assert_eq!(ks[0], TokenKind::Number { text: "10".into(), value: 10.0, unit: None });
        assert_eq!(ks[1], TokenKind::Identifier("auto".into()));
    }

    #[test]
    fn lexes_bracket_and_at_keywords() {
        let ks = tokens("[Template] @Style T { }");
        assert_eq!(ks[0], TokenKind::BracketKeyword("Template".into()));
        assert_eq!(ks[1], TokenKind::AtKeyword("Style".into()));
    }

    #[test]
    fn lexes_string_with_escapes() {
        let ks = tokens("\"a\\nb\"");
        assert_eq!(ks[0], TokenKind::String("a\nb".into()));
    }

    #[test]
    fn lexes_arrow_and_double_colon() {
        let ks = tokens("a->b::c");
        assert!(ks.contains(&TokenKind::Arrow));
        assert!(ks.contains(&TokenKind::DoubleColon));
    }

    #[test]
    fn keyword_rebinding_is_applied() {
        let mut cfg = Configuration::default();
        cfg.set("KEYWORD_Template", "Blueprint");
        let ks = lex("[Blueprint]", "t.chtl", &cfg).unwrap();
        assert_eq!(ks[0].kind, TokenKind::BracketKeyword("Template".into()));
    }
}
