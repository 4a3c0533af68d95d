use serde::{Deserialize, Serialize};

/// Lifecycle phase of the per-workspace scan state machine.
///
/// Wire form is the lowercase name; the editor keys its status-bar text off
/// these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Idle,
    Initializing,
    Building,
    Running,
    Complete,
    Error,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "idle",
            ScanStatus::Initializing => "initializing",
            ScanStatus::Building => "building",
            ScanStatus::Running => "running",
            ScanStatus::Complete => "complete",
            ScanStatus::Error => "error",
        }
    }

    /// True while a compile-and-run cycle owns the workspace; new triggers
    /// must coalesce instead of starting a second cycle.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ScanStatus::Initializing | ScanStatus::Building | ScanStatus::Running
        )
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
