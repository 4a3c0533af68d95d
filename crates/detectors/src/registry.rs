use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use lantern_findings::Finding;
use log::{error, warn};

use crate::builtin::{ManualLamportsZeroing, MissingSigner, UncheckedArithmetic};
use crate::detector::Detector;
use crate::source_unit::SourceUnit;

/// Holds the detector set and runs it file by file.
///
/// Failure isolation: an unparseable file skips that file only, a panicking
/// detector skips that detector for that file only. Everything else runs.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
    disabled: BTreeSet<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }

    /// Registry preloaded with the shipped detector set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(UncheckedArithmetic));
        registry.register(Box::new(MissingSigner));
        registry.register(Box::new(ManualLamportsZeroing));
        registry
    }

    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn disable(&mut self, id: &str) {
        self.disabled.insert(id.to_string());
    }

    pub fn enable(&mut self, id: &str) {
        self.disabled.remove(id);
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        !self.disabled.contains(id)
    }

    /// Ids of all registered detectors, enabled or not.
    pub fn detector_ids(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.id()).collect()
    }

    /// Runs every enabled, applicable detector over one file.
    pub fn run_file(&self, path: &Path, text: &str) -> Vec<Finding> {
        let applicable: Vec<&dyn Detector> = self
            .detectors
            .iter()
            .map(|d| d.as_ref())
            .filter(|d| self.is_enabled(d.id()) && d.applies_to(text))
            .collect();
        if applicable.is_empty() {
            return Vec::new();
        }

        let unit = match SourceUnit::parse(path, text) {
            Ok(unit) => unit,
            Err(err) => {
                warn!("skipping unparseable file: {err}");
                return Vec::new();
            }
        };

        let mut findings = Vec::new();
        for detector in applicable {
            match catch_unwind(AssertUnwindSafe(|| detector.detect(&unit))) {
                Ok(found) => findings.extend(found),
                Err(_) => error!(
                    "detector {} panicked on {}, skipping it for this file",
                    detector.id(),
                    path.display()
                ),
            }
        }
        findings
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_findings::Severity;

    const ANCHOR_SNIPPET: &str = r#"
use anchor_lang::prelude::*;

pub fn add(a: u64, b: u64) -> u64 {
    a + b
}
"#;

    struct PanickingDetector;

    impl Detector for PanickingDetector {
        fn id(&self) -> &'static str {
            "PANICS"
        }
        fn name(&self) -> &'static str {
            "Panicking"
        }
        fn description(&self) -> &'static str {
            "always panics"
        }
        fn message(&self) -> &'static str {
            "unreachable"
        }
        fn severity(&self) -> Severity {
            Severity::Info
        }
        fn detect(&self, _unit: &SourceUnit) -> Vec<Finding> {
            panic!("boom");
        }
    }

    #[test]
    fn ships_three_builtins() {
        let registry = DetectorRegistry::with_builtins();
        assert_eq!(
            registry.detector_ids(),
            vec![
                "UNCHECKED_ARITHMETIC",
                "MISSING_SIGNER",
                "MANUAL_LAMPORTS_ZEROING"
            ]
        );
    }

    #[test]
    fn non_anchor_files_are_gated_out() {
        let registry = DetectorRegistry::with_builtins();
        let findings = registry.run_file(Path::new("/w/plain.rs"), "fn f(a: u64) -> u64 { a + 1 }");
        assert!(findings.is_empty());
    }

    #[test]
    fn unparseable_file_yields_no_findings() {
        let registry = DetectorRegistry::with_builtins();
        let findings = registry.run_file(
            Path::new("/w/broken.rs"),
            "use anchor_lang::prelude::*; fn broken( {",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn disabled_detector_is_skipped() {
        let mut registry = DetectorRegistry::with_builtins();
        registry.disable("UNCHECKED_ARITHMETIC");
        let findings = registry.run_file(Path::new("/w/lib.rs"), ANCHOR_SNIPPET);
        assert!(findings.is_empty());

        registry.enable("UNCHECKED_ARITHMETIC");
        let findings = registry.run_file(Path::new("/w/lib.rs"), ANCHOR_SNIPPET);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn panicking_detector_does_not_poison_the_rest() {
        let mut registry = DetectorRegistry::new();
        registry.register(Box::new(PanickingDetector));
        registry.register(Box::new(UncheckedArithmetic));

        let findings = registry.run_file(Path::new("/w/lib.rs"), ANCHOR_SNIPPET);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].origin.code(), "UNCHECKED_ARITHMETIC");
    }
}
