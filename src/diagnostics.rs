//! Diagnostics: user-facing messages produced while compiling.
//!
//! Resolution runs speculatively: an item may fail several times before the
//! item it depends on is resolved. The collector therefore has a switch that
//! drops error diagnostics during the retry sweeps; the orchestrator enables
//! it for the final pass so every truly unresolved item yields one message.

use std::fmt;
use std::sync::Arc;

use crate::base::Name;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: &'static str,
    /// Module the offending statement belongs to.
    pub module: Option<Name>,
    /// Source line, when the front-end recorded one.
    pub line: Option<u32>,
    /// Schema path of the offending node.
    pub path: Option<String>,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            module: None,
            line: None,
            path: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn with_module(mut self, module: Name) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        if line > 0 {
            self.line = Some(line);
        }
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]", severity, self.code)?;
        if let Some(module) = &self.module {
            write!(f, " {}", module)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }
        write!(f, ": {}", self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Error Code Ranges
///
/// - **E0001-E0099**: Compilation errors (resolution, cycles, constraints)
/// - **W0001-W0099**: Warnings (status, state data references)
pub mod codes {
    // ========================================================================
    // ERRORS (E0001-E0099)
    // ========================================================================

    /// Reference still unresolved at the fixed point.
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Name that cannot exist (unknown prefix or module).
    pub const UNDEFINED_REFERENCE: &str = "E0002";
    /// Malformed embedded path or expression.
    pub const SYNTAX_ERROR: &str = "E0003";
    /// Duplicate definition.
    pub const DUPLICATE_DEFINITION: &str = "E0004";
    /// Circular dependency detected.
    pub const CIRCULAR_DEPENDENCY: &str = "E0007";
    /// Constraint violation.
    pub const CONSTRAINT_VIOLATION: &str = "E0011";
    /// `must`/`when` rejected by the evaluator.
    pub const XPATH_ERROR: &str = "E0015";

    // ========================================================================
    // WARNINGS (W0001-W0099)
    // ========================================================================

    /// Current definition relying on a deprecated or obsolete one.
    pub const DEPRECATED: &str = "W0002";
    /// Config `must`/`when` referring to state data.
    pub const STATE_DATA_REFERENCE: &str = "W0004";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during compilation.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    enabled: bool,
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self {
            diagnostics: Vec::new(),
            enabled: true,
        }
    }
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether error diagnostics are recorded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch error reporting on or off. Warnings are always kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Add a diagnostic; errors are dropped while reporting is disabled.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error && !self.enabled {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Iterate over the diagnostics with a given code.
    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
