use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::Result;

/// Content fingerprint for a plugin source tree.
///
/// Hashes relative path, length and mtime of every file under the plugin
/// root except build output. Walk order is sorted, so the digest is stable
/// for an unchanged tree; touching any source file changes it.
pub fn fingerprint_plugin(plugin_root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    let walker = WalkDir::new(plugin_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry.file_name().to_str()));

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(plugin_root)
            .unwrap_or_else(|_| entry.path());
        hasher.update(relative.to_string_lossy().as_bytes());

        let meta = entry.metadata().map_err(std::io::Error::from)?;
        hasher.update(meta.len().to_be_bytes());
        match meta.modified() {
            Ok(modified) => {
                let mtime_ms = modified
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                hasher.update(mtime_ms.to_be_bytes());
            }
            Err(_) => hasher.update(0u64.to_be_bytes()),
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

fn is_excluded(file_name: Option<&str>) -> bool {
    matches!(file_name, Some("target") | Some(".git"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn seed_plugin(root: &Path) {
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]\nname = \"p\"\n").unwrap();
        fs::write(root.join("src/lib.rs"), "pub fn lint() {}\n").unwrap();
    }

    #[test]
    fn unchanged_tree_gives_the_same_digest() {
        let tmp = TempDir::new().unwrap();
        seed_plugin(tmp.path());

        let first = fingerprint_plugin(tmp.path()).unwrap();
        let second = fingerprint_plugin(tmp.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn source_edit_changes_the_digest() {
        let tmp = TempDir::new().unwrap();
        seed_plugin(tmp.path());
        let before = fingerprint_plugin(tmp.path()).unwrap();

        fs::write(tmp.path().join("src/lib.rs"), "pub fn lint() { let _x = 1; }\n").unwrap();
        let after = fingerprint_plugin(tmp.path()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn build_output_is_ignored() {
        let tmp = TempDir::new().unwrap();
        seed_plugin(tmp.path());
        let before = fingerprint_plugin(tmp.path()).unwrap();

        fs::create_dir_all(tmp.path().join("target/debug")).unwrap();
        fs::write(tmp.path().join("target/debug/libp.so"), [0u8; 16]).unwrap();
        let after = fingerprint_plugin(tmp.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn digest_is_hex_sha256() {
        let tmp = TempDir::new().unwrap();
        seed_plugin(tmp.path());
        let digest = fingerprint_plugin(tmp.path()).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
