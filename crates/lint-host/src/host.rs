use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lantern_findings::Finding;
use log::{info, warn};

use crate::cache::{ArtifactCache, CompiledArtifact};
use crate::compiler::ensure_compiled;
use crate::discovery::discover_plugins;
use crate::engine::{run_plugins, ExecutionOutcome};
use crate::error::Result;
use crate::invoker::CargoRunner;
use crate::toolchain::Toolchain;

/// Compile-phase report: what was discovered, what is ready to run, what
/// failed to build.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    pub artifacts: Vec<CompiledArtifact>,
    pub discovered: usize,
    /// One entry per plugin that failed to compile, `name: reason`.
    pub failed: Vec<String>,
}

/// Outcome of a full host pass over one workspace.
#[derive(Debug, Clone, Default)]
pub struct HostScan {
    pub findings: Vec<Finding>,
    pub plugins_discovered: usize,
    pub plugins_ready: usize,
    pub plugins_failed: Vec<String>,
    pub warning: Option<String>,
}

/// Facade over the plugin pipeline: discovery, fingerprint-keyed
/// compilation and the streamed check run.
///
/// Phases are exposed separately so a caller can report progress between
/// them; [`LintHost::scan`] chains both for one-shot use.
pub struct LintHost {
    runner: Arc<dyn CargoRunner>,
    cache: ArtifactCache,
    toolchain: Toolchain,
    plugin_root: PathBuf,
    check_timeout: Duration,
}

impl LintHost {
    pub fn new(
        runner: Arc<dyn CargoRunner>,
        plugin_root: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        toolchain: Toolchain,
        check_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            runner,
            cache: ArtifactCache::open(cache_dir)?,
            toolchain,
            plugin_root: plugin_root.into(),
            check_timeout,
        })
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Discovers plugins and brings every one of them to a compiled state,
    /// reusing cached artifacts where fingerprints match.
    ///
    /// The toolchain is only verified once at least one plugin exists, so
    /// a workspace without plugins scans fine on a machine without the
    /// pinned nightly. A missing toolchain aborts the pass; a single
    /// plugin failing to build is recorded and skipped while its siblings
    /// continue. Calling this again is also the reload path: discovery
    /// re-walks the plugin root and fingerprints decide what actually
    /// recompiles.
    pub async fn compile_all(&mut self) -> Result<CompileReport> {
        let plugins = discover_plugins(&self.plugin_root);
        info!(
            "discovered {} plugin(s) under {}",
            plugins.len(),
            self.plugin_root.display()
        );
        if plugins.is_empty() {
            return Ok(CompileReport::default());
        }

        self.runner.verify_toolchain(&self.toolchain).await?;

        let mut report = CompileReport {
            discovered: plugins.len(),
            ..CompileReport::default()
        };
        for plugin in &plugins {
            match ensure_compiled(self.runner.as_ref(), &mut self.cache, plugin, &self.toolchain)
                .await
            {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(err) => {
                    warn!("{err}");
                    report.failed.push(format!("{}: {err}", plugin.name));
                }
            }
        }
        Ok(report)
    }

    /// Runs the compiled artifacts over `workspace_root`.
    pub async fn execute(
        &self,
        artifacts: &[CompiledArtifact],
        workspace_root: &Path,
    ) -> Result<ExecutionOutcome> {
        run_plugins(
            self.runner.as_ref(),
            artifacts,
            workspace_root,
            &self.toolchain,
            self.check_timeout,
        )
        .await
    }

    /// Compile everything, then run it.
    pub async fn scan(&mut self, workspace_root: &Path) -> Result<HostScan> {
        let report = self.compile_all().await?;
        let outcome = self.execute(&report.artifacts, workspace_root).await?;
        Ok(HostScan {
            findings: outcome.findings,
            plugins_discovered: report.discovered,
            plugins_ready: report.artifacts.len(),
            plugins_failed: report.failed,
            warning: outcome.warning,
        })
    }
}
