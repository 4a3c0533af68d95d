use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::aggregate::FindingMap;

/// Per-file issue count for the workspace summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIssueCount {
    pub path: String,
    pub issue_count: usize,
    pub is_anchor_program: bool,
}

/// Workspace-level scan summary sent to the editor after each cycle.
///
/// Recomputed from scratch every time; never updated incrementally, so a
/// cycle that fixes the last issue in a file reports that file as clean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub total_files: usize,
    pub anchor_files: usize,
    pub files_with_issues: usize,
    pub total_issues: usize,
    pub issues_by_file: Vec<FileIssueCount>,
    pub is_manual_scan: bool,
}

impl WorkspaceSummary {
    pub fn compute(
        findings: &FindingMap,
        total_files: usize,
        anchor_files: &BTreeSet<PathBuf>,
        is_manual_scan: bool,
    ) -> Self {
        let issues_by_file: Vec<FileIssueCount> = findings
            .iter()
            .filter(|(_, file_findings)| !file_findings.is_empty())
            .map(|(path, file_findings)| FileIssueCount {
                path: path.to_string_lossy().to_string(),
                issue_count: file_findings.len(),
                is_anchor_program: anchor_files.contains(path),
            })
            .collect();

        Self {
            total_files,
            anchor_files: anchor_files.len(),
            files_with_issues: issues_by_file.len(),
            total_issues: issues_by_file.iter().map(|f| f.issue_count).sum(),
            issues_by_file,
            is_manual_scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate, Finding, Origin, Severity, Span};
    use pretty_assertions::assert_eq;

    fn sample_map() -> FindingMap {
        let builtin = vec![
            Finding::new(
                "/w/programs/src/lib.rs",
                Span::point(4, 9),
                Origin::Builtin("missing_signer".into()),
                Severity::Warning,
                "m",
            ),
            Finding::new(
                "/w/programs/src/lib.rs",
                Span::point(12, 5),
                Origin::Builtin("unchecked_arithmetic".into()),
                Severity::Warning,
                "m",
            ),
        ];
        let plugin = vec![Finding::new(
            "/w/programs/src/state.rs",
            Span::point(3, 1),
            Origin::Plugin("unchecked_math".into()),
            Severity::Error,
            "m",
        )];
        aggregate(builtin, plugin)
    }

    #[test]
    fn counts_issues_and_files() {
        let anchor: BTreeSet<PathBuf> = [PathBuf::from("/w/programs/src/lib.rs")].into();
        let summary = WorkspaceSummary::compute(&sample_map(), 7, &anchor, false);

        assert_eq!(summary.total_files, 7);
        assert_eq!(summary.anchor_files, 1);
        assert_eq!(summary.files_with_issues, 2);
        assert_eq!(summary.total_issues, 3);
        assert!(!summary.is_manual_scan);

        let lib = summary
            .issues_by_file
            .iter()
            .find(|f| f.path.ends_with("lib.rs"))
            .unwrap();
        assert_eq!(lib.issue_count, 2);
        assert!(lib.is_anchor_program);
    }

    #[test]
    fn empty_map_is_a_clean_summary() {
        let summary = WorkspaceSummary::compute(&FindingMap::new(), 3, &BTreeSet::new(), true);
        assert_eq!(summary.files_with_issues, 0);
        assert_eq!(summary.total_issues, 0);
        assert!(summary.issues_by_file.is_empty());
        assert!(summary.is_manual_scan);
    }
}
