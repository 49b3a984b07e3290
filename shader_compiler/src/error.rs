use crate::source::SourceFile;
use crate::span::Span;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DiagnosticKind {
    LexError,
    SyntaxError,
    UnknownIdentifier,
    UnknownType,
    ArityMismatch,
    TypeMismatch,
    AmbiguousOverload,
    Redefinition,
    InvalidLvalue,
    MissingDefinition,
    /// Valid JSL that a particular dialect cannot express.
    UnsupportedConstruct,
    /// A broken compiler invariant. Always reported, never swallowed.
    InternalError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                DiagnosticKind::LexError => "lex error",
                DiagnosticKind::SyntaxError => "syntax error",
                DiagnosticKind::UnknownIdentifier => "unknown identifier",
                DiagnosticKind::UnknownType => "unknown type",
                DiagnosticKind::ArityMismatch => "arity mismatch",
                DiagnosticKind::TypeMismatch => "type mismatch",
                DiagnosticKind::AmbiguousOverload => "ambiguous overload",
                DiagnosticKind::Redefinition => "redefinition",
                DiagnosticKind::InvalidLvalue => "invalid lvalue",
                DiagnosticKind::MissingDefinition => "missing definition",
                DiagnosticKind::UnsupportedConstruct => "unsupported construct",
                DiagnosticKind::InternalError => "internal error",
            }
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: Span, message: impl Into<String>) -> Self {
        Diagnostic { kind, span, message: message.into() }
    }

    pub fn format_for_console(&self, source: &SourceFile) -> String {
        let (_, col) = source.line_col_at_offset(self.span.start);
        let line = source.line_at_offset(self.span.start);
        let width = self.span.end.saturating_sub(self.span.start).max(1).min(line.len().saturating_sub(col - 1).max(1));
        format!(
            "{}: {}: {}\n    {}\n    {}{}",
            source.name_line_col_at_offset(self.span.start),
            self.kind,
            self.message,
            line,
            " ".repeat(col - 1),
            "^".repeat(width),
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Generators write into `String`s; a formatting failure there is a compiler bug.
impl From<fmt::Error> for Diagnostic {
    fn from(_: fmt::Error) -> Self {
        Diagnostic::new(DiagnosticKind::InternalError, Span::default(), "failed to format generated code")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_console() {
        let source = SourceFile::new("Foo.jsl", "void main() {\n    color = bogus;\n}\n");
        let diagnostic = Diagnostic::new(DiagnosticKind::UnknownIdentifier, Span::new(26, 31), "`bogus` is not defined");
        assert_eq!(
            diagnostic.format_for_console(&source),
            "Foo.jsl:2:13: unknown identifier: `bogus` is not defined\n        color = bogus;\n                ^^^^^"
        );
    }
}
