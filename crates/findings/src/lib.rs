//! # Lantern Findings
//!
//! Shared data model for security findings.
//!
//! ## Flow
//!
//! ```text
//! Built-in detectors ──┐
//!                      ├──> aggregate() ──> per-file findings ──> WorkspaceSummary
//! Lint plugins ────────┘
//! ```
//!
//! Protocol-agnostic: the server crate converts these types into LSP
//! diagnostics; nothing here depends on tower-lsp.

mod aggregate;
mod finding;
mod severity;
mod status;
mod summary;

pub use aggregate::{aggregate, FindingMap};
pub use finding::{Finding, Origin, Span};
pub use severity::Severity;
pub use status::ScanStatus;
pub use summary::{FileIssueCount, WorkspaceSummary};
