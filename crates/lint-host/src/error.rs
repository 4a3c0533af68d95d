use thiserror::Error;

pub type Result<T> = std::result::Result<T, LintHostError>;

#[derive(Error, Debug)]
pub enum LintHostError {
    /// Scan-blocking: nothing can compile or run without the pinned
    /// toolchain (or its dylint driver) installed.
    #[error("toolchain {toolchain} unavailable: {detail}")]
    ToolchainMissing { toolchain: String, detail: String },

    /// Per-plugin: the named plugin failed to build; siblings continue.
    #[error("failed to compile plugin {plugin}: {detail}")]
    Compile { plugin: String, detail: String },

    /// Cycle-level: the check run produced no usable diagnostics.
    #[error("lint execution failed: {detail}")]
    Execution { detail: String },

    #[error("lint execution timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("artifact cache error: {detail}")]
    Cache { detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
