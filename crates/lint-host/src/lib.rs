//! # Lantern Lint Host
//!
//! Compiles and runs workspace lint plugins (dylint-style dynamic
//! libraries) against an Anchor workspace.
//!
//! ## Pipeline
//!
//! ```text
//! <workspace>/lints/*
//!     │
//!     ├──> Discovery (manifest + pinned toolchain)
//!     │      └─> AnalyzerPlugin
//!     │
//!     ├──> Compiler (fingerprint-keyed artifact cache)
//!     │      └─> CompiledArtifact
//!     │
//!     └──> Engine (cargo check + driver wrapper, streamed JSON)
//!            └─> findings
//! ```
//!
//! All subprocess work goes through the [`CargoRunner`] seam, so the whole
//! pipeline runs deterministically under test with a scripted runner.

mod cache;
mod compiler;
mod discovery;
mod engine;
mod error;
mod fingerprint;
mod host;
mod invoker;
mod parser;
mod toolchain;

pub use cache::{ArtifactCache, CompiledArtifact};
pub use compiler::ensure_compiled;
pub use discovery::{discover_plugins, AnalyzerPlugin};
pub use engine::{run_plugins, ExecutionOutcome};
pub use error::{LintHostError, Result};
pub use fingerprint::fingerprint_plugin;
pub use host::{CompileReport, HostScan, LintHost};
pub use invoker::{CargoRunner, CheckExit, CheckRequest, CheckSession, SystemCargo};
pub use parser::parse_diagnostic_line;
pub use toolchain::{Toolchain, DEFAULT_TOOLCHAIN};
