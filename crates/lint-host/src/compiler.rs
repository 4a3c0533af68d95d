use log::{debug, info, warn};

use crate::cache::{ArtifactCache, CompiledArtifact};
use crate::discovery::AnalyzerPlugin;
use crate::error::{LintHostError, Result};
use crate::fingerprint::fingerprint_plugin;
use crate::invoker::CargoRunner;
use crate::toolchain::Toolchain;

/// Returns a compiled artifact for `plugin`, building only when the cache
/// has no fresh entry.
///
/// Freshness is keyed on `name@toolchain-target` first and compared by
/// source fingerprint second; an unchanged plugin costs zero subprocess
/// spawns. Build failures name the plugin and leave the cache untouched so
/// the caller can continue with its siblings.
pub async fn ensure_compiled(
    runner: &dyn CargoRunner,
    cache: &mut ArtifactCache,
    plugin: &AnalyzerPlugin,
    toolchain: &Toolchain,
) -> Result<CompiledArtifact> {
    let fingerprint = fingerprint_plugin(&plugin.root).map_err(|err| LintHostError::Compile {
        plugin: plugin.name.clone(),
        detail: format!("cannot fingerprint sources: {err}"),
    })?;

    if let Some(hit) = cache.lookup(&plugin.name, toolchain, &fingerprint) {
        debug!("plugin {} unchanged, reusing {}", plugin.name, hit.library_path.display());
        return Ok(hit.clone());
    }

    if plugin.toolchain_channel != toolchain.name() {
        warn!(
            "plugin {} pins {} but the active toolchain is {}; compiling with the active one",
            plugin.name,
            plugin.toolchain_channel,
            toolchain.name()
        );
    }

    info!("compiling plugin {} with {}", plugin.name, toolchain.name());
    let built_library = runner.build_plugin(plugin, toolchain).await?;
    cache.store(&plugin.name, toolchain, &built_library, fingerprint)
}
