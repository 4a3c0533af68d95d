use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use lantern_detectors::{references_anchor, DetectorRegistry};
use lantern_findings::{aggregate, Finding, FindingMap, ScanStatus};
use lantern_lint_host::{LintHost, Result};
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::publish::Publisher;
use crate::workspace::{collect_rust_files, is_test_file};

/// Everything one scan cycle produces, before summary shaping.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub findings: FindingMap,
    pub total_files: usize,
    pub anchor_files: BTreeSet<PathBuf>,
}

/// One full compile-and-analyze cycle over the workspace.
///
/// The lifecycle controller owns when a cycle runs; implementations own
/// what it does. Tests swap in a scripted pipeline to drive the lifecycle
/// without a toolchain.
#[async_trait]
pub trait ScanPipeline: Send + Sync {
    async fn run(&self, publisher: &dyn Publisher) -> Result<ScanOutcome>;
}

/// The real pipeline: built-in detectors plus the lint plugin host.
///
/// Phase statuses go out from here. `Building` covers plugin compilation;
/// `Running` covers the check run and the built-in pass, which execute
/// concurrently.
pub struct LanternPipeline {
    workspace_root: PathBuf,
    registry: DetectorRegistry,
    host: Mutex<LintHost>,
}

impl LanternPipeline {
    pub fn new(workspace_root: PathBuf, registry: DetectorRegistry, host: LintHost) -> Self {
        Self {
            workspace_root,
            registry,
            host: Mutex::new(host),
        }
    }

    /// Runs the built-in detectors over every non-test source file.
    async fn builtin_pass(&self) -> (Vec<Finding>, usize, BTreeSet<PathBuf>) {
        let files = collect_rust_files(&self.workspace_root);
        let total_files = files.len();

        let mut anchor_files = BTreeSet::new();
        let mut findings = Vec::new();
        for path in files {
            if is_test_file(&path) {
                continue;
            }
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(err) => {
                    debug!("skipping unreadable {}: {err}", path.display());
                    continue;
                }
            };
            if references_anchor(&text) {
                anchor_files.insert(path.clone());
            }
            findings.extend(self.registry.run_file(&path, &text));
        }
        (findings, total_files, anchor_files)
    }
}

#[async_trait]
impl ScanPipeline for LanternPipeline {
    async fn run(&self, publisher: &dyn Publisher) -> Result<ScanOutcome> {
        let mut host = self.host.lock().await;

        publisher
            .publish_status(ScanStatus::Building, "Compiling lint plugins")
            .await;
        let report = host.compile_all().await?;
        if !report.failed.is_empty() {
            warn!(
                "{} plugin(s) failed to compile: {}",
                report.failed.len(),
                report.failed.join("; ")
            );
        }

        publisher
            .publish_status(ScanStatus::Running, "Scanning workspace")
            .await;
        let ((builtin, total_files, anchor_files), plugin) = tokio::join!(
            self.builtin_pass(),
            host.execute(&report.artifacts, &self.workspace_root),
        );
        let plugin = plugin?;
        if let Some(warning) = &plugin.warning {
            warn!("{warning}");
        }

        info!(
            "cycle done: {} built-in and {} plugin finding(s) across {} file(s)",
            builtin.len(),
            plugin.findings.len(),
            total_files
        );
        Ok(ScanOutcome {
            findings: aggregate(builtin, plugin.findings),
            total_files,
            anchor_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_findings::WorkspaceSummary;
    use lantern_lint_host::{
        AnalyzerPlugin, CargoRunner, CheckRequest, CheckSession, LintHostError, Toolchain,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct NullRunner;

    #[async_trait]
    impl CargoRunner for NullRunner {
        async fn verify_toolchain(&self, _toolchain: &Toolchain) -> lantern_lint_host::Result<()> {
            unreachable!("no plugins, no toolchain check")
        }
        async fn build_plugin(
            &self,
            _plugin: &AnalyzerPlugin,
            _toolchain: &Toolchain,
        ) -> lantern_lint_host::Result<std::path::PathBuf> {
            unreachable!("no plugins to build")
        }
        async fn start_check(
            &self,
            _request: &CheckRequest,
        ) -> lantern_lint_host::Result<Box<dyn CheckSession>> {
            Err(LintHostError::Execution {
                detail: "not scripted".into(),
            })
        }
    }

    #[derive(Default)]
    struct StatusLog(std::sync::Mutex<Vec<ScanStatus>>);

    #[async_trait]
    impl Publisher for StatusLog {
        async fn publish_diagnostics(&self, _file: &Path, _findings: &[Finding]) {}
        async fn publish_status(&self, status: ScanStatus, _message: &str) {
            self.0.lock().unwrap().push(status);
        }
        async fn publish_summary(&self, _summary: &WorkspaceSummary) {}
    }

    fn pipeline_for(root: &Path) -> LanternPipeline {
        let host = LintHost::new(
            Arc::new(NullRunner),
            root.join("lints"),
            root.join(".cache"),
            Toolchain::with_target("nightly-2025-09-18", "x86_64-unknown-linux-gnu"),
            Duration::from_secs(5),
        )
        .unwrap();
        LanternPipeline::new(root.to_path_buf(), DetectorRegistry::with_builtins(), host)
    }

    #[tokio::test]
    async fn builtins_run_without_any_plugins() {
        let dir = TempDir::new().unwrap();
        let program = dir.path().join("programs/vault/src");
        fs::create_dir_all(&program).unwrap();
        fs::write(
            program.join("lib.rs"),
            "use anchor_lang::prelude::*;\n\npub fn add(a: u64, b: u64) -> u64 {\n    a + b\n}\n",
        )
        .unwrap();
        let tests_dir = dir.path().join("program-tests");
        fs::create_dir_all(&tests_dir).unwrap();
        fs::write(tests_dir.join("flow.rs"), "fn main() {}\n").unwrap();

        let publisher = StatusLog::default();
        let outcome = pipeline_for(dir.path()).run(&publisher).await.unwrap();

        assert_eq!(outcome.total_files, 2);
        assert_eq!(outcome.anchor_files.len(), 1);
        let findings = &outcome.findings[&program.join("lib.rs")];
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].origin.code(), "UNCHECKED_ARITHMETIC");

        let statuses = publisher.0.lock().unwrap().clone();
        assert_eq!(statuses, vec![ScanStatus::Building, ScanStatus::Running]);
    }

    #[tokio::test]
    async fn non_anchor_sources_produce_nothing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("lib.rs"), "pub fn plain(a: u64, b: u64) -> u64 { a + b }\n").unwrap();

        let publisher = StatusLog::default();
        let outcome = pipeline_for(dir.path()).run(&publisher).await.unwrap();

        assert_eq!(outcome.total_files, 1);
        assert!(outcome.anchor_files.is_empty());
        assert!(outcome.findings.is_empty());
    }
}
