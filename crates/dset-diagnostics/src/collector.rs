//! Diagnostics collector
//!
//! Every component that can fail receives a `&mut Diagnostics`. Reports are
//! written to the matching stream the moment they arrive, so they interleave
//! with other process output in discovery order, and are also kept for the
//! caller to inspect afterwards.

use crate::record::{DiagnosticRecord, Severity, TextPosition};
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

/// Source name used for reports about anonymous text
pub const STREAM_SOURCE: &str = "input";

/// Collects errors and warnings from path mapping, parsing and validation
#[derive(Default)]
pub struct Diagnostics {
    records: Vec<DiagnosticRecord>,
    found_errors: bool,
    found_warnings: bool,
    error_stream: Option<Box<dyn Write>>,
    warning_stream: Option<Box<dyn Write>>,
}

impl Diagnostics {
    /// Create a collector that only records
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector that echoes errors and warnings to stderr
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_streams(io::stderr(), io::stderr())
    }

    /// Create a collector that echoes to separate error and warning streams
    #[must_use]
    pub fn with_streams(errors: impl Write + 'static, warnings: impl Write + 'static) -> Self {
        Self {
            error_stream: Some(Box::new(errors)),
            warning_stream: Some(Box::new(warnings)),
            ..Self::default()
        }
    }

    /// Report an error in a named file, optionally at a position
    pub fn add_error(
        &mut self,
        file: &str,
        position: Option<TextPosition>,
        message: impl Into<String>,
    ) {
        self.push(file, position, Severity::Error, message.into(), None);
    }

    /// Report a warning in a named file, optionally at a position
    pub fn add_warning(
        &mut self,
        file: &str,
        position: Option<TextPosition>,
        message: impl Into<String>,
    ) {
        self.push(file, position, Severity::Warning, message.into(), None);
    }

    /// Report a tokenizer error in anonymous text
    pub fn add_stream_error(&mut self, line: u32, column: u32, message: impl Into<String>) {
        let position = Some(TextPosition::new(line, column));
        self.push(STREAM_SOURCE, position, Severity::Error, message.into(), None);
    }

    /// Report a tokenizer warning in anonymous text
    pub fn add_stream_warning(&mut self, line: u32, column: u32, message: impl Into<String>) {
        let position = Some(TextPosition::new(line, column));
        self.push(STREAM_SOURCE, position, Severity::Warning, message.into(), None);
    }

    /// Report a semantic error about a named element of a file
    pub fn add_element_error(&mut self, file: &str, element: &str, message: impl Into<String>) {
        let element = Some(element.to_string());
        self.push(file, None, Severity::Error, message.into(), element);
    }

    /// Report a semantic warning about a named element of a file
    pub fn add_element_warning(&mut self, file: &str, element: &str, message: impl Into<String>) {
        let element = Some(element.to_string());
        self.push(file, None, Severity::Warning, message.into(), element);
    }

    /// Whether any error has been reported
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.found_errors
    }

    /// Whether any warning has been reported
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.found_warnings
    }

    /// All records in emission order
    #[must_use]
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records.iter().filter(|r| r.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records.iter().filter(|r| r.severity == Severity::Warning)
    }

    /// Number of error records
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    fn push(
        &mut self,
        source: &str,
        position: Option<TextPosition>,
        severity: Severity,
        message: String,
        element: Option<String>,
    ) {
        let record = DiagnosticRecord {
            source: source.to_string(),
            position,
            severity,
            message,
            element,
        };

        let stream = match severity {
            Severity::Error => {
                self.found_errors = true;
                debug!(source = %record.source, "error: {}", record.message);
                self.error_stream.as_mut()
            }
            Severity::Warning => {
                self.found_warnings = true;
                debug!(source = %record.source, "warning: {}", record.message);
                self.warning_stream.as_mut()
            }
        };

        // Stream write failures are ignored; the record is kept regardless.
        if let Some(out) = stream {
            let _ = writeln!(out, "{record}");
            let _ = out.flush();
        }

        self.records.push(record);
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("records", &self.records)
            .field("found_errors", &self.found_errors)
            .field("found_warnings", &self.found_warnings)
            .finish_non_exhaustive()
    }
}
