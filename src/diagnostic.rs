use core::fmt;
use std::rc::Rc;

use crate::lexer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// What a diagnostic is about. Mirrors the declaration-time error taxonomy
/// plus the analysis-only policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    InvalidMemberValue,
    ExtendRequired,
    MultipleParents,
    UnresolvedParent,
    InheritedNameCollision,
    AliasCollision,
    MalformedIgnore,
    NotCallable,
    NotAMember,
    UnsupportedTypeTest,
}

/// A non-fatal finding surfaced to the hosting analysis tool's report.
///
/// Diagnostics never abort analysis; subsequent declarations are always
/// processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub file: Rc<str>,
    pub line: u32,
    pub col: u32,
}

impl Diagnostic {
    pub fn error(span: &Span, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::at(span, kind, Severity::Error, message)
    }

    pub fn warning(span: &Span, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::at(span, kind, Severity::Warning, message)
    }

    pub fn at(
        span: &Span,
        kind: DiagnosticKind,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            severity,
            message: message.into(),
            file: span.source.file().as_str().into(),
            line: span.line,
            col: span.col,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}:{}: {severity}: {}",
            self.file, self.line, self.col, self.message
        )
    }
}
