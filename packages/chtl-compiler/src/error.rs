//! Error kinds and the per-compilation diagnostic collector (spec §7).

use crate::parse_util::{Diagnostic, Severity, Span};
use std::fmt;

/// The seven error kinds spec §7 defines, each carrying the diagnostic that
/// describes it. Variants map to CLI exit codes in `exit_code`.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Io(Diagnostic),
    #[error("{0}")]
    Syntax(Diagnostic),
    #[error("{0}")]
    Semantic(Diagnostic),
    #[error("{0}")]
    Import(Diagnostic),
    #[error("{0}")]
    Evaluation(Diagnostic),
    #[error("{0}")]
    CodeGen(Diagnostic),
    #[error("{0}")]
    Config(Diagnostic),
}

impl CompileError {
    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            CompileError::Io(d)
            | CompileError::Syntax(d)
            | CompileError::Semantic(d)
            | CompileError::Import(d)
            | CompileError::Evaluation(d)
            | CompileError::CodeGen(d)
            | CompileError::Config(d) => d,
        }
    }

    /// Exit code mapping from spec §6.1: 0 success, 1 compile error, 2 I/O
    /// error, 3 usage error. `Config` in strict mode and usage mistakes are
    /// the CLI's responsibility; everything the core can raise is either an
    /// I/O error or a compile error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Io(_) => 2,
            _ => 1,
        }
    }

    pub fn syntax(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        CompileError::Syntax(Diagnostic::error(kind, message, span))
    }

    pub fn semantic(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        CompileError::Semantic(Diagnostic::error(kind, message, span))
    }

    pub fn import(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        CompileError::Import(Diagnostic::error(kind, message, span))
    }

    pub fn evaluation(kind: &'static str, message: impl Into<String>, span: Option<Span>) -> Self {
        CompileError::Evaluation(Diagnostic::error(kind, message, span))
    }

    pub fn io(message: impl Into<String>) -> Self {
        CompileError::Io(Diagnostic::error("io", message, None))
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Accumulates diagnostics for one compilation unit. Syntax/IO errors abort
/// the current file; semantic errors accumulate and are reported together
/// at the end of that file's pipeline (spec §7 propagation policy).
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostics_log(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn push_error(&mut self, err: &CompileError) {
        self.push(err.diagnostic().clone());
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

fn diagnostics_log(diagnostic: &Diagnostic) {
    match diagnostic.severity {
        Severity::Error => log::error!("{diagnostic}"),
        Severity::Warning => log::warn!("{diagnostic}"),
    }
}

impl fmt::Display for DiagnosticCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.diagnostics {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_tracks_error_presence() {
        let mut collector = DiagnosticCollector::new();
        assert!(!collector.has_errors());
        collector.push(Diagnostic::warning("config", "unknown key", None));
        assert!(!collector.has_errors());
        collector.push(Diagnostic::error("semantic", "duplicate definition", None));
        assert!(collector.has_errors());
    }

    #[test]
    fn exit_codes_match_spec() {
        assert_eq!(CompileError::io("missing").exit_code(), 2);
        assert_eq!(
            CompileError::syntax("syntax", "bad token", None).exit_code(),
            1
        );
    }
}
