use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};

use crate::discovery::AnalyzerPlugin;
use crate::error::{LintHostError, Result};
use crate::toolchain::Toolchain;

/// Everything the engine needs to launch one workspace check.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub workspace_root: PathBuf,
    pub toolchain: Toolchain,
    pub driver_path: PathBuf,
    pub artifact_paths: Vec<PathBuf>,
}

/// Exit state of a finished check subprocess.
#[derive(Debug, Clone)]
pub struct CheckExit {
    pub success: bool,
    pub stderr_tail: String,
}

/// A running workspace check whose stdout is consumed line by line.
///
/// Pull-based so the engine can stop reading at any point; diagnostics
/// parsed before a timeout or crash are kept.
#[async_trait]
pub trait CheckSession: Send {
    /// Next stdout line, `None` at end of stream.
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Waits for the subprocess to exit.
    async fn finish(self: Box<Self>) -> Result<CheckExit>;

    /// Kills the subprocess without waiting for diagnostics.
    async fn terminate(self: Box<Self>) -> Result<()>;
}

/// Injection seam for every cargo subprocess the host spawns. Production
/// uses [`SystemCargo`]; tests script the whole pipeline with a fake.
#[async_trait]
pub trait CargoRunner: Send + Sync {
    /// Confirms the toolchain is installed and responding.
    async fn verify_toolchain(&self, toolchain: &Toolchain) -> Result<()>;

    /// Builds one plugin, returning the path of the produced library.
    async fn build_plugin(
        &self,
        plugin: &AnalyzerPlugin,
        toolchain: &Toolchain,
    ) -> Result<PathBuf>;

    /// Spawns `cargo check` with the lint driver wired in.
    async fn start_check(&self, request: &CheckRequest) -> Result<Box<dyn CheckSession>>;
}

/// Spawns real cargo processes.
pub struct SystemCargo;

impl SystemCargo {
    /// PATH for spawned processes. Editors launch the server with a
    /// stripped environment, so `~/.cargo/bin` has to be added back for
    /// rustup shims to resolve.
    fn subprocess_path() -> String {
        let current = std::env::var("PATH").unwrap_or_default();
        match dirs::home_dir() {
            Some(home) => format!(
                "{}:/usr/local/bin:/usr/bin:{current}",
                home.join(".cargo").join("bin").display()
            ),
            None => current,
        }
    }

    fn locate_build_output(plugin: &AnalyzerPlugin, toolchain: &Toolchain) -> Result<PathBuf> {
        let target_root = plugin.root.join("target");
        for profile in ["debug", "release"] {
            let dir = target_root.join(profile);
            for name in toolchain.build_output_names(&plugin.name) {
                let candidate = dir.join(&name);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
        }
        Err(LintHostError::Compile {
            plugin: plugin.name.clone(),
            detail: format!(
                "build succeeded but no library found under {}",
                target_root.display()
            ),
        })
    }
}

#[async_trait]
impl CargoRunner for SystemCargo {
    async fn verify_toolchain(&self, toolchain: &Toolchain) -> Result<()> {
        let output = Command::new("rustc")
            .arg(toolchain.cargo_selector())
            .arg("--version")
            .env("PATH", Self::subprocess_path())
            .output()
            .await
            .map_err(|err| LintHostError::ToolchainMissing {
                toolchain: toolchain.name().to_string(),
                detail: format!("cannot run rustc: {err}"),
            })?;

        if !output.status.success() {
            return Err(LintHostError::ToolchainMissing {
                toolchain: toolchain.name().to_string(),
                detail: tail(&String::from_utf8_lossy(&output.stderr), 500),
            });
        }
        debug!(
            "toolchain check: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    async fn build_plugin(
        &self,
        plugin: &AnalyzerPlugin,
        toolchain: &Toolchain,
    ) -> Result<PathBuf> {
        let output = Command::new("cargo")
            .arg(toolchain.cargo_selector())
            .arg("build")
            .arg("--manifest-path")
            .arg(&plugin.manifest_path)
            .current_dir(&plugin.root)
            .env("PATH", Self::subprocess_path())
            .output()
            .await
            .map_err(|err| LintHostError::Compile {
                plugin: plugin.name.clone(),
                detail: format!("cannot spawn cargo: {err}"),
            })?;

        if !output.status.success() {
            return Err(LintHostError::Compile {
                plugin: plugin.name.clone(),
                detail: tail(&String::from_utf8_lossy(&output.stderr), 2000),
            });
        }

        Self::locate_build_output(plugin, toolchain)
    }

    async fn start_check(&self, request: &CheckRequest) -> Result<Box<dyn CheckSession>> {
        // The driver install is part of the toolchain setup; without it the
        // wrapper env var would silently run plain rustc and report nothing.
        if !request.driver_path.exists() {
            return Err(LintHostError::ToolchainMissing {
                toolchain: request.toolchain.name().to_string(),
                detail: format!(
                    "dylint driver not installed at {}",
                    request.driver_path.display()
                ),
            });
        }

        let libs_json = serde_json::to_string(
            &request
                .artifact_paths
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect::<Vec<_>>(),
        )?;
        debug!("DYLINT_LIBS: {libs_json}");

        let mut child = Command::new("cargo")
            .arg(request.toolchain.cargo_selector())
            .args(["check", "--workspace", "--message-format=json"])
            .current_dir(&request.workspace_root)
            .env("PATH", Self::subprocess_path())
            .env("RUSTC_WORKSPACE_WRAPPER", &request.driver_path)
            .env("DYLINT_LIBS", libs_json)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| LintHostError::Execution {
            detail: "check subprocess has no stdout pipe".into(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| LintHostError::Execution {
            detail: "check subprocess has no stderr pipe".into(),
        })?;

        // Drain stderr concurrently; a full pipe would stall the child long
        // before stdout reaches end of stream.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        Ok(Box::new(SystemCheckSession {
            child,
            lines: BufReader::new(stdout).lines(),
            stderr_task,
        }))
    }
}

struct SystemCheckSession {
    child: Child,
    lines: tokio::io::Lines<BufReader<ChildStdout>>,
    stderr_task: tokio::task::JoinHandle<String>,
}

#[async_trait]
impl CheckSession for SystemCheckSession {
    async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    async fn finish(mut self: Box<Self>) -> Result<CheckExit> {
        let status = self.child.wait().await?;
        let stderr_tail = tail(&self.stderr_task.await.unwrap_or_default(), 2000);
        Ok(CheckExit {
            success: status.success(),
            stderr_tail,
        })
    }

    async fn terminate(mut self: Box<Self>) -> Result<()> {
        self.stderr_task.abort();
        self.child.kill().await?;
        Ok(())
    }
}

/// Last `max` bytes of `text`, aligned to a char boundary.
pub(crate) fn tail(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.trim_end().to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text_intact() {
        assert_eq!(tail("error: boom\n", 100), "error: boom");
    }

    #[test]
    fn tail_truncates_from_the_front() {
        let text = "x".repeat(50) + "tail end";
        let cut = tail(&text, 8);
        assert_eq!(cut, "tail end");
    }

    #[test]
    fn tail_respects_char_boundaries() {
        let text = "ééééé";
        let cut = tail(text, 3);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
