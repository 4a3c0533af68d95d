use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::warn;

/// Directory names never worth analyzing: build output and editor state.
const SKIPPED_DIRS: [&str; 5] = ["target", "node_modules", ".git", ".vscode", "out"];

/// Collects the Rust sources under `root`, honouring `.gitignore` and
/// skipping build output. Results are sorted so scan order is stable.
pub fn collect_rust_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let scope = root.to_path_buf();
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);
    builder.filter_entry(move |entry| !is_skipped_scope(entry.path(), &scope));

    for result in builder.build() {
        match result {
            Ok(entry) => {
                let Some(file_type) = entry.file_type() else {
                    continue;
                };
                if !file_type.is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some("rs") {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => warn!("failed to read entry: {err}"),
        }
    }

    files.sort();
    files
}

fn is_skipped_scope(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| match component {
        std::path::Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name)),
        _ => false,
    })
}

/// Test sources are counted in the file total but never analyzed; the
/// rules target program code, not test scaffolding.
pub fn is_test_file(path: &Path) -> bool {
    path.to_string_lossy().contains("test")
}
