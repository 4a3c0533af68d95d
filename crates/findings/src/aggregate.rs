use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::finding::{Finding, Origin};

/// Findings grouped per file, sorted within each file.
pub type FindingMap = BTreeMap<PathBuf, Vec<Finding>>;

/// Merges built-in and plugin findings into one per-file map.
///
/// Duplicates are collapsed on (file, line_start, column_start, origin): when
/// a built-in detector and a plugin lint share an origin name and hit the same
/// position only the first survives. Pure function; merging the same inputs
/// twice yields identical output.
pub fn aggregate(builtin: Vec<Finding>, plugin: Vec<Finding>) -> FindingMap {
    let mut seen: BTreeSet<(PathBuf, u32, u32, Origin)> = BTreeSet::new();
    let mut map: FindingMap = BTreeMap::new();

    for finding in builtin.into_iter().chain(plugin) {
        let key = (
            finding.file.clone(),
            finding.span.line_start,
            finding.span.column_start,
            finding.origin.clone(),
        );
        if !seen.insert(key) {
            continue;
        }
        map.entry(finding.file.clone()).or_default().push(finding);
    }

    for findings in map.values_mut() {
        findings.sort();
    }
    map
}
