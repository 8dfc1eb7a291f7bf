//! Diagnostics for what analysis could not make sense of.
//!
//! Unresolved expressions become warnings; syntax errors and scope
//! structure faults become errors. Positions are 1-based, like every
//! other position in the crate.

use std::sync::Arc;

use crate::base::FileId;
use crate::syntax::{ParseError, SyntaxTree};

use super::symbol_table::SymtabError;
use super::types::Unresolved;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub file: FileId,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub severity: Severity,
    /// Error/warning code (e.g., "W0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
}

impl Diagnostic {
    pub fn error(file: FileId, line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, line, col, Severity::Error, message)
    }

    pub fn warning(file: FileId, line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(file, line, col, Severity::Warning, message)
    }

    fn new(file: FileId, line: u32, col: u32, severity: Severity, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
            severity,
            code: None,
            message: message.into(),
        }
    }

    /// Set the end of the span.
    pub fn with_span(mut self, end_line: u32, end_col: u32) -> Self {
        self.end_line = end_line;
        self.end_col = end_col;
        self
    }

    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

pub mod codes {
    /// Source text the front end could not parse.
    pub const SYNTAX_ERROR: &str = "E0001";
    /// Broken scope structure while building or resolving.
    pub const SCOPE_FAULT: &str = "E0002";

    /// A name or expression that could not be resolved.
    pub const UNRESOLVED: &str = "W0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics across the analysis passes.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Warn about an unresolved expression, spanning its whole subtree.
    pub fn unresolved(&mut self, tree: &SyntaxTree, unresolved: &Unresolved) {
        let (start, end) = tree.extent(unresolved.node.node);
        self.add(
            Diagnostic::warning(
                unresolved.node.file,
                start.line,
                start.column,
                format!("unresolved: '{}'", unresolved.text),
            )
            .with_span(end.line, end.column)
            .with_code(codes::UNRESOLVED),
        );
    }

    pub fn syntax_error(&mut self, file: FileId, error: &ParseError) {
        let (line, col) = error.position().unwrap_or((0, 0));
        self.add(Diagnostic::error(file, line, col, error.to_string()).with_code(codes::SYNTAX_ERROR));
    }

    pub fn scope_fault(&mut self, file: FileId, fault: &SymtabError) {
        self.add(Diagnostic::error(file, 0, 0, fault.to_string()).with_code(codes::SCOPE_FAULT));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn diagnostics_for_file(&self, file: FileId) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.file == file).collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SyntaxKind, parse};

    #[test]
    fn test_diagnostic_error() {
        let diag = Diagnostic::error(FileId::new(0), 10, 5, "test error");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.start_line, 10);
        assert_eq!(diag.start_col, 5);
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::warning(FileId::new(0), 1, 1, "test").with_code(codes::UNRESOLVED);
        assert_eq!(diag.code.as_deref(), Some("W0001"));
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.add(Diagnostic::error(FileId::new(0), 1, 1, "error 1"));
        collector.add(Diagnostic::error(FileId::new(0), 1, 1, "error 2"));
        collector.add(Diagnostic::warning(FileId::new(0), 1, 1, "warning 1"));

        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert_eq!(collector.take().len(), 3);
        assert!(collector.diagnostics().is_empty());
    }

    #[test]
    fn test_collector_by_file() {
        let mut collector = DiagnosticCollector::new();
        collector.add(Diagnostic::error(FileId::new(0), 1, 1, "file 0"));
        collector.add(Diagnostic::error(FileId::new(1), 1, 1, "file 1"));
        collector.add(Diagnostic::error(FileId::new(0), 1, 1, "file 0 again"));

        assert_eq!(collector.diagnostics_for_file(FileId::new(0)).len(), 2);
        assert_eq!(collector.diagnostics_for_file(FileId::new(1)).len(), 1);
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Warning.to_lsp(), 2);
        assert_eq!(Severity::Info.to_lsp(), 3);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }

    #[test]
    fn test_unresolved_spans_the_dotted_name() {
        let file = FileId::new(3);
        let tree = parse(file, "class A {\n  Object o = foo.bar;\n}").unwrap();
        let root = tree.root().unwrap();
        let dot = tree
            .descendants(root)
            .into_iter()
            .find(|&n| tree.kind(n) == SyntaxKind::Dot)
            .unwrap();
        let mut collector = DiagnosticCollector::new();
        collector.unresolved(&tree, &Unresolved::new("foo.bar", tree.node_ref(dot)));

        let diag = &collector.diagnostics()[0];
        assert_eq!(diag.file, file);
        assert_eq!((diag.start_line, diag.start_col), (2, 14));
        assert_eq!((diag.end_line, diag.end_col), (2, 20));
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.message.contains("foo.bar"));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse(FileId::new(0), "class {").unwrap_err();
        let mut collector = DiagnosticCollector::new();
        collector.syntax_error(FileId::new(0), &err);
        let diag = &collector.diagnostics()[0];
        assert_eq!(diag.code.as_deref(), Some(codes::SYNTAX_ERROR));
        assert_eq!((diag.start_line, diag.start_col), (1, 7));
    }
}
