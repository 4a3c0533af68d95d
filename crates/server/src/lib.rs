//! # Lantern Server
//!
//! LSP front end wiring the scan lifecycle to an editor.
//!
//! ## Flow
//!
//! ```text
//! Editor (stdio)
//!     │
//!     ├──> Backend (tower-lsp handlers)
//!     │      └─> triggers
//!     │
//!     ├──> ScanController (single-owner lifecycle task)
//!     │      └─> at most one cycle in flight
//!     │
//!     └──> LanternPipeline (built-in detectors + lint host)
//!            └─> Publisher: diagnostics, status, summary
//! ```
//!
//! The protocol loop never blocks on analysis: triggers are queued to the
//! lifecycle task and cycles run on their own task.

mod backend;
mod config;
mod controller;
mod notifications;
mod pipeline;
mod publish;
mod server;
mod workspace;

pub use backend::{Backend, RELOAD_DETECTORS_COMMAND, SCAN_WORKSPACE_COMMAND};
pub use config::ServerConfig;
pub use controller::{ScanController, ScanTrigger};
pub use notifications::{ScanStatusNotification, ScanStatusParams, ScanSummaryNotification};
pub use pipeline::{LanternPipeline, ScanOutcome, ScanPipeline};
pub use publish::{LspPublisher, Publisher};
pub use server::{create_service, start_server};
pub use workspace::{collect_rust_files, is_test_file};
