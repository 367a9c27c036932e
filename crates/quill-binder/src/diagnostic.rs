//! Diagnostic rendering for binder errors
//!
//! Wraps a [`BindError`] into a structured diagnostic with a stable error
//! code, severity, and (module, line) location, emitted to a terminal with
//! colors or serialized to JSON for IDE integration. Column information is
//! not tracked at this layer and is reported as unavailable.

use crate::decl::SourceLocation;
use crate::error::BindError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Compilation cannot proceed
    Error,
    /// Suspicious but not fatal
    Warning,
    /// Additional context
    Note,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }

    fn color(self) -> Color {
        match self {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Note => Color::Cyan,
        }
    }
}

/// A structured diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<String>,
    message: String,
    location: Option<SourceLocation>,
    notes: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code: None,
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the source location
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }

    /// The error code, if set
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The severity
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Build a diagnostic from a binder error
    pub fn from_bind_error(error: &BindError) -> Self {
        let mut diag = Diagnostic::error(error.to_string()).with_code(error.code());

        match error {
            BindError::UnresolvedName { location, .. }
            | BindError::TypeMismatch { location, .. }
            | BindError::UpdatingInitializer { location, .. }
            | BindError::DuplicateVariable { location, .. }
            | BindError::Expression { location, .. } => {
                diag = diag.with_location(location.clone());
            }
            BindError::ImportBoundary { ty, .. } => {
                diag = diag.with_help(format!(
                    "import the schema that defines {ty} into this module"
                ));
            }
            BindError::DuplicateFunction { .. }
            | BindError::DoubleCompilation { .. }
            | BindError::ConflictingResolution { .. } => {}
        }

        if error.is_internal() {
            diag = diag.with_note("this is a bug in the compiler, not in the query");
        }
        diag
    }

    /// Emit with colors to the given stream
    pub fn emit(&self, writer: &mut dyn WriteColor) -> std::io::Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(self.severity.color())).set_bold(true))?;
        write!(writer, "{}", self.severity.label())?;
        if let Some(code) = &self.code {
            write!(writer, "[{code}]")?;
        }
        writer.reset()?;
        writeln!(writer, ": {}", self.message)?;

        if let Some(location) = &self.location {
            writeln!(writer, "  --> {location} (column unavailable)")?;
        }
        for note in &self.notes {
            writeln!(writer, "  = {note}")?;
        }
        Ok(())
    }

    /// Emit to stderr with automatic color detection
    pub fn emit_stderr(&self) -> std::io::Result<()> {
        let mut stream = StandardStream::stderr(ColorChoice::Auto);
        self.emit(&mut stream)
    }

    /// Serialize for IDE integration
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonDiagnostic::from(self))
    }
}

/// JSON representation of a diagnostic
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g. "XPST0008")
    pub code: Option<String>,
    /// Severity label
    pub severity: String,
    /// Main message
    pub message: String,
    /// Module identity, when a location is known
    pub module: Option<String>,
    /// Line number, when a location is known
    pub line: Option<u32>,
    /// Column is never tracked at this layer
    pub column: Option<u32>,
    /// Notes and help suggestions
    pub notes: Vec<String>,
}

impl From<&Diagnostic> for JsonDiagnostic {
    fn from(diag: &Diagnostic) -> Self {
        JsonDiagnostic {
            code: diag.code.clone(),
            severity: diag.severity.label().to_string(),
            message: diag.message.clone(),
            module: diag.location.as_ref().map(|l| l.module.clone()),
            line: diag.location.as_ref().map(|l| l.line),
            column: None,
            notes: diag.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_types::QName;
    use termcolor::Buffer;

    #[test]
    fn test_from_unresolved_name() {
        let err = BindError::UnresolvedName {
            name: QName::local("ghost"),
            location: SourceLocation::new("main.xq", 12),
        };
        let diag = Diagnostic::from_bind_error(&err);
        assert_eq!(diag.code(), Some("XPST0008"));
        assert_eq!(diag.severity(), Severity::Error);
    }

    #[test]
    fn test_boundary_violation_suggests_import() {
        let err = BindError::ImportBoundary {
            function: QName::new("http://example.com/ns1", "make"),
            arity: 1,
            ty: "Q{http://example.com/schema}part".to_string(),
        };
        let diag = Diagnostic::from_bind_error(&err);
        assert!(diag.notes.iter().any(|n| n.starts_with("help:")));
    }

    #[test]
    fn test_emit_contains_code_and_location() {
        let diag = Diagnostic::error("Undeclared variable: x")
            .with_code("XPST0008")
            .with_location(SourceLocation::new("main.xq", 3));

        let mut buffer = Buffer::no_color();
        diag.emit(&mut buffer).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(text.contains("error[XPST0008]"));
        assert!(text.contains("main.xq:3"));
        assert!(text.contains("column unavailable"));
    }

    #[test]
    fn test_json_output() {
        let err = BindError::UnresolvedName {
            name: QName::local("ghost"),
            location: SourceLocation::new("main.xq", 12),
        };
        let json = Diagnostic::from_bind_error(&err).to_json().unwrap();
        assert!(json.contains("\"XPST0008\""));
        assert!(json.contains("\"main.xq\""));
        assert!(json.contains("\"line\": 12"));
        // Column stays null
        assert!(json.contains("\"column\": null"));
    }
}
