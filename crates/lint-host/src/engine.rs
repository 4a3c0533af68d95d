use std::path::Path;
use std::time::Duration;

use lantern_findings::Finding;
use log::{debug, info, warn};
use tokio::time::Instant;

use crate::cache::CompiledArtifact;
use crate::error::{LintHostError, Result};
use crate::invoker::{CargoRunner, CheckRequest};
use crate::parser::parse_diagnostic_line;
use crate::toolchain::Toolchain;

/// Result of one workspace check run.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub findings: Vec<Finding>,
    /// Set when the run was degraded but still produced findings, e.g. the
    /// subprocess exited nonzero after emitting diagnostics.
    pub warning: Option<String>,
}

/// Runs every compiled plugin over the workspace in a single streamed
/// `cargo check` pass.
///
/// Stdout is parsed line by line as it arrives, never buffered to
/// completion. A nonzero exit with findings in hand degrades to a warning;
/// a nonzero exit with nothing parsed is an execution error; exceeding
/// `timeout` kills the subprocess and returns a timeout error with no
/// findings, leaving the previous diagnostic set untouched at the caller.
pub async fn run_plugins(
    runner: &dyn CargoRunner,
    artifacts: &[CompiledArtifact],
    workspace_root: &Path,
    toolchain: &Toolchain,
    timeout: Duration,
) -> Result<ExecutionOutcome> {
    if artifacts.is_empty() {
        debug!("no compiled plugins, skipping check run");
        return Ok(ExecutionOutcome::default());
    }

    let home = dirs::home_dir().ok_or_else(|| LintHostError::Execution {
        detail: "cannot determine home directory for the lint driver".into(),
    })?;

    let allowed_lints: Vec<String> = artifacts.iter().map(|a| a.lint_name()).collect();
    let request = CheckRequest {
        workspace_root: workspace_root.to_path_buf(),
        toolchain: toolchain.clone(),
        driver_path: toolchain.driver_path(&home),
        artifact_paths: artifacts.iter().map(|a| a.library_path.clone()).collect(),
    };

    info!(
        "running {} lint plugin(s) over {}",
        artifacts.len(),
        workspace_root.display()
    );

    let mut session = runner.start_check(&request).await?;
    let deadline = Instant::now() + timeout;
    let mut findings = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            session.terminate().await.ok();
            warn!("lint run exceeded {}s, killed", timeout.as_secs());
            return Err(LintHostError::Timeout {
                secs: timeout.as_secs(),
            });
        }

        match tokio::time::timeout(remaining, session.next_line()).await {
            Err(_) => {
                session.terminate().await.ok();
                warn!("lint run exceeded {}s, killed", timeout.as_secs());
                return Err(LintHostError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
            Ok(Err(err)) => {
                session.terminate().await.ok();
                return Err(err);
            }
            Ok(Ok(Some(line))) => {
                if let Some(finding) = parse_diagnostic_line(&line, &allowed_lints, workspace_root)
                {
                    findings.push(finding);
                }
            }
            Ok(Ok(None)) => break,
        }
    }

    let exit = session.finish().await?;
    if exit.success {
        info!("lint run complete, {} finding(s)", findings.len());
        return Ok(ExecutionOutcome {
            findings,
            warning: None,
        });
    }

    if findings.is_empty() {
        return Err(LintHostError::Execution {
            detail: if exit.stderr_tail.is_empty() {
                "cargo check exited nonzero with no diagnostics".into()
            } else {
                exit.stderr_tail
            },
        });
    }

    // Compile errors elsewhere in the workspace still let lints fire on the
    // crates that did build; keep what we got.
    let warning = format!(
        "lint run exited nonzero but produced {} finding(s); results may be incomplete",
        findings.len()
    );
    warn!("{warning}");
    Ok(ExecutionOutcome {
        findings,
        warning: Some(warning),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::{CheckExit, CheckSession};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn artifact(plugin: &str) -> CompiledArtifact {
        CompiledArtifact {
            plugin: plugin.into(),
            toolchain: "nightly-2025-09-18".into(),
            target: "x86_64-unknown-linux-gnu".into(),
            library_path: PathBuf::from(format!("/cache/lib{plugin}.so")),
            fingerprint: "f".into(),
        }
    }

    fn diagnostic_line(code: &str) -> String {
        format!(
            r#"{{"reason":"compiler-message","message":{{"code":{{"code":"{code}"}},"level":"warning","message":"m","spans":[{{"is_primary":true,"expansion":null,"file_name":"src/lib.rs","line_start":3,"line_end":3,"column_start":1,"column_end":4}}]}}}}"#
        )
    }

    /// Session scripted from a fixed line list.
    struct ScriptedSession {
        lines: std::vec::IntoIter<ScriptStep>,
        exit: CheckExit,
        terminated: Arc<AtomicBool>,
    }

    enum ScriptStep {
        Line(String),
        Hang,
    }

    #[async_trait]
    impl CheckSession for ScriptedSession {
        async fn next_line(&mut self) -> Result<Option<String>> {
            match self.lines.next() {
                Some(ScriptStep::Line(line)) => Ok(Some(line)),
                Some(ScriptStep::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
                None => Ok(None),
            }
        }

        async fn finish(self: Box<Self>) -> Result<CheckExit> {
            Ok(self.exit)
        }

        async fn terminate(self: Box<Self>) -> Result<()> {
            self.terminated.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct ScriptedRunner {
        lines: Vec<String>,
        success: bool,
        hang_after: bool,
        terminated: Arc<AtomicBool>,
    }

    impl ScriptedRunner {
        fn new(lines: Vec<String>, success: bool) -> Self {
            Self {
                lines,
                success,
                hang_after: false,
                terminated: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    #[async_trait]
    impl CargoRunner for ScriptedRunner {
        async fn verify_toolchain(&self, _toolchain: &Toolchain) -> Result<()> {
            Ok(())
        }

        async fn build_plugin(
            &self,
            plugin: &crate::AnalyzerPlugin,
            _toolchain: &Toolchain,
        ) -> Result<PathBuf> {
            Err(LintHostError::Compile {
                plugin: plugin.name.clone(),
                detail: "not scripted".into(),
            })
        }

        async fn start_check(&self, _request: &CheckRequest) -> Result<Box<dyn CheckSession>> {
            let mut steps: Vec<ScriptStep> = self
                .lines
                .iter()
                .map(|l| ScriptStep::Line(l.clone()))
                .collect();
            if self.hang_after {
                steps.push(ScriptStep::Hang);
            }
            Ok(Box::new(ScriptedSession {
                lines: steps.into_iter(),
                exit: CheckExit {
                    success: self.success,
                    stderr_tail: "error: linking failed".into(),
                },
                terminated: Arc::clone(&self.terminated),
            }))
        }
    }

    fn toolchain() -> Toolchain {
        Toolchain::with_target("nightly-2025-09-18", "x86_64-unknown-linux-gnu")
    }

    #[tokio::test]
    async fn empty_artifact_set_skips_the_subprocess() {
        let runner = ScriptedRunner::new(vec![diagnostic_line("unchecked_math")], true);
        let outcome = run_plugins(&runner, &[], Path::new("/w"), &toolchain(), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(outcome.findings.is_empty());
        assert!(outcome.warning.is_none());
    }

    #[tokio::test]
    async fn valid_lines_among_noise_yield_exactly_their_findings() {
        let lines = vec![
            String::new(),
            "warming up".into(),
            diagnostic_line("unchecked_math"),
            r#"{"reason":"compiler-artifact","target":{"name":"vault"}}"#.into(),
            diagnostic_line("unchecked_math"),
            diagnostic_line("not_our_lint"),
        ];
        let runner = ScriptedRunner::new(lines, true);
        let outcome = run_plugins(
            &runner,
            &[artifact("unchecked-math")],
            Path::new("/w"),
            &toolchain(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.findings.len(), 2);
        assert!(outcome.warning.is_none());
        assert!(outcome
            .findings
            .iter()
            .all(|f| f.file == PathBuf::from("/w/src/lib.rs")));
    }

    #[tokio::test]
    async fn nonzero_exit_with_findings_is_partial_success() {
        let lines = vec![
            diagnostic_line("unchecked_math"),
            diagnostic_line("unchecked_math"),
        ];
        let runner = ScriptedRunner::new(lines, false);
        let outcome = run_plugins(
            &runner,
            &[artifact("unchecked-math")],
            Path::new("/w"),
            &toolchain(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.findings.len(), 2);
        assert!(outcome.warning.is_some());
    }

    #[tokio::test]
    async fn nonzero_exit_without_findings_is_an_error() {
        let runner = ScriptedRunner::new(vec!["garbage".into()], false);
        let err = run_plugins(
            &runner,
            &[artifact("unchecked-math")],
            Path::new("/w"),
            &toolchain(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();

        match err {
            LintHostError::Execution { detail } => assert!(detail.contains("linking failed")),
            other => panic!("expected execution error, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_subprocess_times_out_and_is_killed() {
        let mut runner = ScriptedRunner::new(vec![diagnostic_line("unchecked_math")], true);
        runner.hang_after = true;
        let terminated = Arc::clone(&runner.terminated);

        let err = run_plugins(
            &runner,
            &[artifact("unchecked-math")],
            Path::new("/w"),
            &toolchain(),
            Duration::from_secs(300),
        )
        .await
        .unwrap_err();

        match err {
            LintHostError::Timeout { secs } => assert_eq!(secs, 300),
            other => panic!("expected timeout, got {other}"),
        }
        assert!(terminated.load(Ordering::SeqCst));
    }
}
