use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// A lint plugin found in the workspace plugin root.
///
/// Immutable snapshot: discovery re-reads everything each pass instead of
/// mutating earlier results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerPlugin {
    pub name: String,
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    /// Channel pinned by the plugin's own `rust-toolchain[.toml]`.
    pub toolchain_channel: String,
}

/// Walks exactly one level of subdirectories under `plugin_root` and keeps
/// the ones that look like lint crates.
///
/// A candidate needs a parseable manifest with a package name, a pinned
/// toolchain file, and either a dylib-style crate-type or a dylint
/// dependency. Anything else is skipped with a warning; a missing plugin
/// root is an empty result, not an error.
pub fn discover_plugins(plugin_root: &Path) -> Vec<AnalyzerPlugin> {
    if !plugin_root.is_dir() {
        debug!("plugin root {} does not exist", plugin_root.display());
        return Vec::new();
    }

    let entries = match fs::read_dir(plugin_root) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read plugin root {}: {err}", plugin_root.display());
            return Vec::new();
        }
    };

    let mut plugins = Vec::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        if let Some(plugin) = inspect_candidate(&dir) {
            plugins.push(plugin);
        }
    }

    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    plugins
}

fn inspect_candidate(dir: &Path) -> Option<AnalyzerPlugin> {
    let manifest_path = dir.join("Cargo.toml");
    let manifest_text = match fs::read_to_string(&manifest_path) {
        Ok(text) => text,
        Err(_) => {
            debug!("{} has no manifest, not a plugin", dir.display());
            return None;
        }
    };

    let manifest: toml::Value = match toml::from_str(&manifest_text) {
        Ok(value) => value,
        Err(err) => {
            warn!("skipping {}: malformed manifest: {err}", dir.display());
            return None;
        }
    };

    let name = match manifest
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
    {
        Some(name) => name.to_string(),
        None => {
            warn!("skipping {}: manifest has no package name", dir.display());
            return None;
        }
    };

    if !is_lint_crate(&manifest) {
        warn!(
            "skipping {name}: not a lint crate (no dylib crate-type or dylint dependency)"
        );
        return None;
    }

    let toolchain_channel = match read_toolchain_channel(dir) {
        Some(channel) => channel,
        None => {
            warn!("skipping {name}: no pinned rust-toolchain file");
            return None;
        }
    };

    Some(AnalyzerPlugin {
        name,
        root: dir.to_path_buf(),
        manifest_path,
        toolchain_channel,
    })
}

/// Lint crates compile to a dynamic library the driver can load; ordinary
/// crates that happen to live in the plugin root must not be built.
fn is_lint_crate(manifest: &toml::Value) -> bool {
    let dylib_crate_type = manifest
        .get("lib")
        .and_then(|lib| lib.get("crate-type"))
        .and_then(|ct| ct.as_array())
        .map(|types| {
            types
                .iter()
                .filter_map(|t| t.as_str())
                .any(|t| t == "cdylib" || t == "dylib")
        })
        .unwrap_or(false);

    let dylint_dependency = manifest
        .get("dependencies")
        .and_then(|deps| deps.as_table())
        .map(|deps| deps.keys().any(|k| k.contains("dylint")))
        .unwrap_or(false);

    dylib_crate_type || dylint_dependency
}

fn read_toolchain_channel(dir: &Path) -> Option<String> {
    for file_name in ["rust-toolchain.toml", "rust-toolchain"] {
        let path = dir.join(file_name);
        let Ok(text) = fs::read_to_string(&path) else {
            continue;
        };
        match parse_toolchain_channel(&text) {
            Some(channel) => return Some(channel),
            None => warn!("unreadable toolchain channel in {}", path.display()),
        }
    }
    None
}

fn parse_toolchain_channel(text: &str) -> Option<String> {
    if let Ok(value) = toml::from_str::<toml::Value>(text) {
        if let Some(channel) = value
            .get("toolchain")
            .and_then(|t| t.get("channel"))
            .and_then(|c| c.as_str())
        {
            return Some(channel.to_string());
        }
    }

    // Legacy single-line form: the file body is the channel itself.
    let trimmed = text.trim();
    if !trimmed.is_empty() && trimmed.lines().count() == 1 && !trimmed.contains('[') {
        return Some(trimmed.to_string());
    }
    None
}
