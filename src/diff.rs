//! Unified diff of the body against the formatter's output.

use similar::TextDiff;

/// Render a unified diff with three lines of context. Invalid UTF-8 is
/// replaced lossily.
pub fn unified(original: &[u8], formatted: &[u8]) -> String {
    let original = String::from_utf8_lossy(original);
    let formatted = String::from_utf8_lossy(formatted);
    TextDiff::from_lines(original.as_ref(), formatted.as_ref())
        .unified_diff()
        .context_radius(3)
        .header("body", "formatted")
        .to_string()
}
