//! Source positions and spans (spec §3.1).
//!
//! Grounded on the retrieved compiler's `parse_util.rs`: a source file owns
//! its text, a location is `{file, offset, line, col}`, and a span is a pair
//! of locations. Positions survive every pass so diagnostics can always
//! point back at the original bytes.

use std::fmt;
use std::rc::Rc;

/// The text of one source file, shared by every position that points into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub content: Rc<str>,
    pub url: String,
}

impl SourceFile {
    pub fn new(content: impl Into<Rc<str>>, url: impl Into<String>) -> Self {
        SourceFile {
            content: content.into(),
            url: url.into(),
        }
    }
}

/// A single point in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file: Rc<SourceFile>,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(file: Rc<SourceFile>, offset: usize, line: usize, col: usize) -> Self {
        Position { file, offset, line, col }
    }

    pub fn start_of(file: Rc<SourceFile>) -> Self {
        Position::new(file, 0, 0, 0)
    }

    /// Returns up to `max_chars` of context on either side of this position,
    /// clipped to at most `max_lines` newlines in each direction.
    pub fn context(&self, max_chars: usize, max_lines: usize) -> (String, String) {
        let content = &*self.file.content;
        let bytes = content.as_bytes();
        let at = self.offset.min(bytes.len());

        let mut start = at;
        let mut lines = 0;
        while start > 0 && at - start < max_chars {
            start -= 1;
            if bytes[start] == b'\n' {
                lines += 1;
                if lines >= max_lines {
                    break;
                }
            }
        }

        let mut end = at;
        lines = 0;
        while end < bytes.len() && end - at < max_chars {
            if bytes[end] == b'\n' {
                lines += 1;
                if lines >= max_lines {
                    break;
                }
            }
            end += 1;
        }

        (content[start..at].to_string(), content[at..end].to_string())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.url, self.line + 1, self.col + 1)
    }
}

/// A begin/end pair of positions. Every token and AST node carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset, "span begin must not be after end");
        Span { start, end }
    }

    pub fn text(&self) -> &str {
        &self.start.file.content[self.start.offset..self.end.offset]
    }

    /// Merge two spans from the same file into one spanning both.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start.clone(), other.end.clone())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic, as described in spec §7.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
    pub primary_span: Option<Span>,
    pub related_spans: Vec<(String, Span)>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
            primary_span: span,
            related_spans: Vec::new(),
            hint: None,
        }
    }

    pub fn warning(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            primary_span: span,
            related_spans: Vec::new(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_related(mut self, label: impl Into<String>, span: Span) -> Self {
        self.related_spans.push((label.into(), span));
        self
    }

    /// A one-line, contextualised rendering suitable for terminal output.
    pub fn contextual_message(&self) -> String {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match &self.primary_span {
            Some(span) => {
                let (before, after) = span.start.context(80, 2);
                format!(
                    "{level}[{}]: {} ({}@{} ->{})",
                    self.kind, self.message, before, span.start, after
                )
            }
            None => format!("{level}[{}]: {}", self.kind, self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.contextual_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(content: &str) -> Rc<SourceFile> {
        Rc::new(SourceFile::new(content, "test.chtl"))
    }

    #[test]
    fn span_text_round_trips() {
        let f = file("div { text { \"hi\" } }");
        let start = Position::new(f.clone(), 0, 0, 0);
        let end = Position::new(f.clone(), 3, 0, 3);
        let span = Span::new(start, end);
        assert_eq!(span.text(), "div");
    }

    #[test]
    fn position_display_is_one_indexed() {
        let f = file("a\nb");
        let pos = Position::new(f, 2, 1, 0);
        assert_eq!(pos.to_string(), "test.chtl:2:1");
    }

    #[test]
    fn context_clips_to_max_chars() {
        let f = file(&"x".repeat(200));
        let pos = Position::new(f, 100, 0, 100);
        let (before, after) = pos.context(10, 5);
        assert_eq!(before.len(), 10);
        assert_eq!(after.len(), 10);
    }
}
