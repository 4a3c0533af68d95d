use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// 1-based source span. `column_end` is exclusive, matching rustc spans.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Span {
    pub line_start: u32,
    pub column_start: u32,
    pub line_end: u32,
    pub column_end: u32,
}

impl Span {
    pub fn new(line_start: u32, column_start: u32, line_end: u32, column_end: u32) -> Self {
        Self {
            line_start,
            column_start,
            line_end,
            column_end,
        }
    }

    /// Zero-width span at a single position.
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }
}

/// Where a finding came from. Rendered as the diagnostic code so the editor
/// can distinguish shipped rules from workspace lint plugins.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Origin {
    /// A built-in structural detector, identified by rule id.
    Builtin(String),
    /// A compiled lint plugin, identified by lint name.
    Plugin(String),
}

impl Origin {
    pub fn code(&self) -> &str {
        match self {
            Origin::Builtin(id) => id,
            Origin::Plugin(name) => name,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single security finding. Field order defines the derived ordering:
/// (file, span, origin) first, so sorted output is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub file: PathBuf,
    pub span: Span,
    pub origin: Origin,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn new(
        file: impl Into<PathBuf>,
        span: Span,
        origin: Origin,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            span,
            origin,
            severity,
            message: message.into(),
        }
    }
}
