//! Diagnostic records and their text rendering

use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The invocation cannot succeed
    Error,
    /// Reported, but does not fail the invocation
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// Zero-based line and column inside a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    pub line: u32,
    pub column: u32,
}

impl TextPosition {
    /// Create a zero-based position
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert from the one-based numbers most parsers report.
    ///
    /// A zero column (reported by some parsers at end of input) clamps to
    /// the first column.
    #[must_use]
    pub fn from_one_based(line: usize, column: usize) -> Self {
        let to_zero_based = |n: usize| u32::try_from(n.saturating_sub(1)).unwrap_or(u32::MAX);
        Self {
            line: to_zero_based(line),
            column: to_zero_based(column),
        }
    }
}

/// One normalized error or warning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// File name, or `input` for anonymous text
    pub source: String,
    /// Position, when the reporter knew one
    pub position: Option<TextPosition>,
    pub severity: Severity,
    pub message: String,
    /// Fully qualified element the report is about, for semantic reports
    pub element: Option<String>,
}

impl DiagnosticRecord {
    /// Whether this record fails the invocation
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for DiagnosticRecord {
    /// `<source>[:<line>:<column>]: [warning: ]<message>` with one-based
    /// line and column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)?;
        if let Some(position) = self.position {
            write!(
                f,
                ":{}:{}",
                u64::from(position.line) + 1,
                u64::from(position.column) + 1
            )?;
        }
        match self.severity {
            Severity::Warning => write!(f, ": warning: {}", self.message),
            Severity::Error => write!(f, ": {}", self.message),
        }
    }
}
