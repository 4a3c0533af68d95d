//! Lantern Language Server
//!
//! Background security analysis for Anchor workspaces over LSP.
//!
//! ## Commands
//!
//! - `lantern.scanWorkspace` - Run a full manual scan
//! - `lantern.reloadDetectors` - Re-walk the plugin directory and rescan
//!
//! ## Usage
//!
//! Point an LSP client at the binary over stdio:
//! ```json
//! {
//!   "languageServers": {
//!     "lantern": {
//!       "command": "lantern"
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use lantern_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for the LSP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServerConfig::from_env();
    log::info!(
        "Starting Lantern language server v{} (toolchain {})",
        env!("CARGO_PKG_VERSION"),
        config.toolchain
    );

    start_server(config).await;

    log::info!("Lantern language server stopped");
    Ok(())
}
