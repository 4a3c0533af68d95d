use serde::{Deserialize, Serialize};

/// Severity of a finding. Ordered so that `Error` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Maps a rustc diagnostic level to a severity.
    ///
    /// Unknown levels degrade to `Warning` rather than dropping the
    /// diagnostic; a surfaced finding with an imperfect severity beats a
    /// silently discarded one.
    pub fn from_diagnostic_level(level: &str) -> Self {
        match level {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "note" | "help" => Severity::Info,
            _ => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
