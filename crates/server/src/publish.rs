use std::path::Path;

use async_trait::async_trait;
use lantern_findings::{Finding, ScanStatus, Severity, WorkspaceSummary};
use log::warn;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range, Url};
use tower_lsp::Client;

use crate::notifications::{ScanStatusNotification, ScanStatusParams, ScanSummaryNotification};

/// Outbound channel to the editor.
///
/// The lifecycle talks to this trait instead of holding a tower-lsp
/// [`Client`] directly, so tests can record what would have been sent.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Replaces the diagnostic set for one file. An empty slice clears it.
    async fn publish_diagnostics(&self, file: &Path, findings: &[Finding]);
    async fn publish_status(&self, status: ScanStatus, message: &str);
    async fn publish_summary(&self, summary: &WorkspaceSummary);
}

/// Publisher backed by the real LSP client.
pub struct LspPublisher {
    client: Client,
}

impl LspPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for LspPublisher {
    async fn publish_diagnostics(&self, file: &Path, findings: &[Finding]) {
        let Ok(uri) = Url::from_file_path(file) else {
            warn!("not a publishable path: {}", file.display());
            return;
        };
        let diagnostics = findings.iter().map(to_diagnostic).collect();
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    async fn publish_status(&self, status: ScanStatus, message: &str) {
        self.client
            .send_notification::<ScanStatusNotification>(ScanStatusParams {
                status,
                message: message.to_string(),
            })
            .await;
    }

    async fn publish_summary(&self, summary: &WorkspaceSummary) {
        self.client
            .send_notification::<ScanSummaryNotification>(summary.clone())
            .await;
    }
}

/// Converts one finding to protocol shape. Findings are 1-based with an
/// exclusive end column; LSP positions are 0-based.
fn to_diagnostic(finding: &Finding) -> Diagnostic {
    Diagnostic {
        range: Range {
            start: Position {
                line: finding.span.line_start.saturating_sub(1),
                character: finding.span.column_start.saturating_sub(1),
            },
            end: Position {
                line: finding.span.line_end.saturating_sub(1),
                character: finding.span.column_end.saturating_sub(1),
            },
        },
        severity: Some(to_lsp_severity(finding.severity)),
        code: Some(NumberOrString::String(finding.origin.code().to_string())),
        source: Some("lantern".to_string()),
        message: finding.message.clone(),
        ..Diagnostic::default()
    }
}

fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    }
}
