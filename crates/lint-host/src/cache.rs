use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LintHostError, Result};
use crate::toolchain::Toolchain;

const INDEX_FILE_NAME: &str = "index.json";

/// A compiled plugin library tracked by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    pub plugin: String,
    pub toolchain: String,
    pub target: String,
    pub library_path: PathBuf,
    /// Source fingerprint at compile time.
    pub fingerprint: String,
}

impl CompiledArtifact {
    /// Lint name as the driver reports it: the crate name with dashes
    /// normalized to underscores.
    pub fn lint_name(&self) -> String {
        self.plugin.replace('-', "_")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheIndex {
    entries: BTreeMap<String, CompiledArtifact>,
}

/// On-disk artifact cache: compiled libraries plus a JSON index mapping
/// `name@toolchain-target` to artifact metadata.
///
/// The toolchain is part of the key, so switching toolchains leaves the old
/// entries in place and switching back is an ordinary hit.
pub struct ArtifactCache {
    root: PathBuf,
    index: CacheIndex,
}

impl ArtifactCache {
    /// Opens (or creates) the cache at `root`. A corrupt index is discarded
    /// and rebuilt; an unwritable root is a user-visible error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| LintHostError::Cache {
            detail: format!("cannot create cache directory {}: {err}", root.display()),
        })?;
        let index = Self::load_index(&root);
        Ok(Self { root, index })
    }

    pub fn key_for(plugin_name: &str, toolchain: &Toolchain) -> String {
        format!("{plugin_name}@{}-{}", toolchain.name(), toolchain.target())
    }

    /// A hit requires the key to exist, the stored fingerprint to match and
    /// the library file to still be on disk.
    pub fn lookup(
        &self,
        plugin_name: &str,
        toolchain: &Toolchain,
        fingerprint: &str,
    ) -> Option<&CompiledArtifact> {
        let key = Self::key_for(plugin_name, toolchain);
        let entry = self.index.entries.get(&key)?;
        if entry.fingerprint != fingerprint {
            debug!("cache entry {key} is stale, sources changed");
            return None;
        }
        if !entry.library_path.exists() {
            debug!("cache entry {key} lost its library file");
            return None;
        }
        Some(entry)
    }

    /// Copies a freshly built library into the cache and replaces the index
    /// entry for its exact key.
    pub fn store(
        &mut self,
        plugin_name: &str,
        toolchain: &Toolchain,
        built_library: &Path,
        fingerprint: String,
    ) -> Result<CompiledArtifact> {
        let destination = self.root.join(toolchain.artifact_file_name(plugin_name));
        fs::copy(built_library, &destination).map_err(|err| LintHostError::Cache {
            detail: format!(
                "cannot copy {} into cache: {err}",
                built_library.display()
            ),
        })?;

        let artifact = CompiledArtifact {
            plugin: plugin_name.to_string(),
            toolchain: toolchain.name().to_string(),
            target: toolchain.target().to_string(),
            library_path: destination,
            fingerprint,
        };
        self.index
            .entries
            .insert(Self::key_for(plugin_name, toolchain), artifact.clone());
        self.persist()?;
        Ok(artifact)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.index.entries.values()
    }

    fn load_index(root: &Path) -> CacheIndex {
        let path = root.join(INDEX_FILE_NAME);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(_) => return CacheIndex::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(index) => index,
            Err(err) => {
                warn!(
                    "discarding corrupt cache index {}: {err}",
                    path.display()
                );
                CacheIndex::default()
            }
        }
    }

    /// The index is replaced wholesale via tmp+rename, never patched in
    /// place, so readers only ever observe a complete file.
    fn persist(&self) -> Result<()> {
        let path = self.root.join(INDEX_FILE_NAME);
        let bytes = serde_json::to_vec_pretty(&self.index)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|err| LintHostError::Cache {
            detail: format!("cannot write cache index: {err}"),
        })?;
        fs::rename(&tmp, &path).map_err(|err| LintHostError::Cache {
            detail: format!("cannot replace cache index: {err}"),
        })?;
        Ok(())
    }
}
