use lantern_findings::{Finding, Origin, Severity};

use crate::source_unit::SourceUnit;

/// Cheap textual gate shared by the built-in detectors: structural analysis
/// only pays off for files that pull in the Anchor framework.
pub fn references_anchor(text: &str) -> bool {
    text.contains("anchor_lang") || text.contains("anchor_spl")
}

/// A built-in structural security detector.
///
/// Implementations are stateless; `detect` must be pure so the registry can
/// run it on any file in any order and retry after failures.
pub trait Detector: Send + Sync {
    /// Stable rule id, rendered as the diagnostic code.
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Message attached to every finding this detector produces.
    fn message(&self) -> &'static str;

    fn severity(&self) -> Severity;

    /// Fast pre-parse gate on the raw file text. Files failing the gate are
    /// never parsed for this detector.
    fn applies_to(&self, text: &str) -> bool {
        references_anchor(text)
    }

    fn detect(&self, unit: &SourceUnit) -> Vec<Finding>;

    /// Builds a finding at `span` carrying this detector's identity.
    fn finding_at(&self, unit: &SourceUnit, span: proc_macro2::Span) -> Finding {
        Finding::new(
            unit.path(),
            unit.span(span),
            Origin::Builtin(self.id().to_string()),
            self.severity(),
            self.message(),
        )
    }
}
