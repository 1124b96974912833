//! Assertions over collected diagnostics.

use yanglink::{Diagnostic, Severity};

/// Number of diagnostics carrying `code`.
pub fn count_code(diagnostics: &[Diagnostic], code: &str) -> usize {
    diagnostics.iter().filter(|d| d.code == code).count()
}

/// Asserts that at least one diagnostic carries `code`.
pub fn assert_has_code(diagnostics: &[Diagnostic], code: &str) {
    assert!(
        count_code(diagnostics, code) > 0,
        "expected a {} diagnostic, got: {:?}",
        code,
        diagnostics.iter().map(|d| d.to_string()).collect::<Vec<_>>()
    );
}

/// Asserts that no error was collected.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.to_string())
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
}
