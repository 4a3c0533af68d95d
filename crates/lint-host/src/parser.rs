use std::path::Path;

use lantern_findings::{Finding, Origin, Severity, Span};
use serde_json::Value;

/// Parses one line of `cargo check --message-format=json` output into a
/// finding.
///
/// Whitelist model: only `compiler-message` records whose code matches a
/// loaded lint survive. Everything else (blank lines, cargo progress
/// records, rustc's own lints, macro-expansion diagnostics, truncated
/// JSON) returns `None` and is dropped from the stream without ceremony.
pub fn parse_diagnostic_line(
    line: &str,
    allowed_lints: &[String],
    workspace_root: &Path,
) -> Option<Finding> {
    if line.trim().is_empty() {
        return None;
    }
    let json: Value = serde_json::from_str(line).ok()?;
    if json.get("reason").and_then(|r| r.as_str()) != Some("compiler-message") {
        return None;
    }
    let message = json.get("message")?;

    let code = message
        .get("code")
        .and_then(|c| c.get("code"))
        .and_then(|c| c.as_str())?;
    if !allowed_lints.iter().any(|lint| lint == code) {
        return None;
    }

    let spans = message.get("spans").and_then(|s| s.as_array())?;
    let primary = spans
        .iter()
        .find(|s| s.get("is_primary").and_then(|p| p.as_bool()) == Some(true))?;

    // Spans inside macro expansions point at generated code the user never
    // wrote; surfacing them produces squiggles at the macro call site of
    // some other file.
    if primary.get("expansion").is_some_and(|e| !e.is_null()) {
        return None;
    }

    let file_name = primary.get("file_name").and_then(|f| f.as_str())?;
    let line_start = primary.get("line_start").and_then(|l| l.as_u64())? as u32;
    let line_end = primary.get("line_end").and_then(|l| l.as_u64())? as u32;
    let column_start = primary.get("column_start").and_then(|c| c.as_u64())? as u32;
    let column_end = primary.get("column_end").and_then(|c| c.as_u64())? as u32;

    let text = message.get("message").and_then(|m| m.as_str())?;
    let level = message.get("level").and_then(|l| l.as_str())?;

    let file = if Path::new(file_name).is_absolute() {
        file_name.into()
    } else {
        workspace_root.join(file_name)
    };

    Some(Finding::new(
        file,
        Span::new(line_start, column_start, line_end, column_end),
        Origin::Plugin(code.to_string()),
        Severity::from_diagnostic_level(level),
        text,
    ))
}
