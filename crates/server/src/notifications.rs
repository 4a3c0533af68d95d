use lantern_findings::{ScanStatus, WorkspaceSummary};
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;

/// Payload of `lantern/scanStatus`: one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStatusParams {
    pub status: ScanStatus,
    pub message: String,
}

/// Custom notification announcing scan lifecycle transitions. The editor
/// keys its status-bar item off these.
#[derive(Debug)]
pub enum ScanStatusNotification {}

impl Notification for ScanStatusNotification {
    type Params = ScanStatusParams;
    const METHOD: &'static str = "lantern/scanStatus";
}

/// Custom notification carrying the workspace summary after a completed
/// cycle. `is_manual_scan` tells the editor whether to pop a result dialog
/// or stay quiet.
#[derive(Debug)]
pub enum ScanSummaryNotification {}

impl Notification for ScanSummaryNotification {
    type Params = WorkspaceSummary;
    const METHOD: &'static str = "lantern/scanSummary";
}
