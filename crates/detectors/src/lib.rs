//! # Lantern Detectors
//!
//! Built-in structural security detectors for Anchor programs.
//!
//! ## Pipeline
//!
//! ```text
//! File text
//!     │
//!     ├──> applies_to() gate (cheap, textual)
//!     │
//!     ├──> SourceUnit::parse (syn AST, once per file)
//!     │
//!     └──> DetectorRegistry ──> findings
//!            └─> each detector isolated via catch_unwind
//! ```
//!
//! Detectors are pure: `detect` takes a parsed unit and returns findings,
//! holding no state between files. A panicking detector or an unparseable
//! file never takes the rest of the scan down.

mod builtin;
mod detector;
mod error;
mod registry;
mod source_unit;

pub use builtin::{ManualLamportsZeroing, MissingSigner, UncheckedArithmetic};
pub use detector::{references_anchor, Detector};
pub use error::{DetectorError, Result};
pub use registry::DetectorRegistry;
pub use source_unit::SourceUnit;
