use std::path::PathBuf;
use std::sync::Arc;

use lantern_detectors::DetectorRegistry;
use lantern_findings::ScanStatus;
use lantern_lint_host::{LintHost, SystemCargo, Toolchain};
use log::{debug, error, info, warn};
use tower_lsp::jsonrpc::Result as JsonRpcResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::config::ServerConfig;
use crate::controller::{ScanController, ScanTrigger};
use crate::pipeline::LanternPipeline;
use crate::publish::{LspPublisher, Publisher};

pub const SCAN_WORKSPACE_COMMAND: &str = "lantern.scanWorkspace";
pub const RELOAD_DETECTORS_COMMAND: &str = "lantern.reloadDetectors";

enum ScanState {
    NotReady,
    Ready(ScanController),
    /// The pipeline could not be built, typically a cache-directory I/O
    /// failure. Reported to the editor once the client is ready.
    Failed(String),
}

/// The LSP face of the server. Protocol handlers return immediately;
/// anything heavy is forwarded to the lifecycle task.
pub struct Backend {
    client: Client,
    config: ServerConfig,
    scan: tokio::sync::Mutex<ScanState>,
}

impl Backend {
    pub fn new(client: Client, config: ServerConfig) -> Self {
        Self {
            client,
            config,
            scan: tokio::sync::Mutex::new(ScanState::NotReady),
        }
    }

    #[allow(deprecated)] // root_uri is the fallback for older clients
    fn workspace_root(params: &InitializeParams) -> PathBuf {
        if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
            if let Ok(path) = folder.uri.to_file_path() {
                return path;
            }
        }
        if let Some(path) = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()) {
            return path;
        }
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    async fn trigger(&self, trigger: ScanTrigger) {
        let controller = match &*self.scan.lock().await {
            ScanState::Ready(controller) => controller.clone(),
            ScanState::NotReady => {
                warn!("dropping {trigger:?}: server was never initialized");
                return;
            }
            ScanState::Failed(detail) => {
                warn!("dropping {trigger:?}: {detail}");
                if matches!(trigger, ScanTrigger::Manual | ScanTrigger::Reload) {
                    LspPublisher::new(self.client.clone())
                        .publish_status(ScanStatus::Error, detail)
                        .await;
                }
                return;
            }
        };
        controller.trigger(trigger).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> JsonRpcResult<InitializeResult> {
        let workspace_root = Self::workspace_root(&params);
        info!("initializing for workspace {}", workspace_root.display());

        let toolchain = Toolchain::new(self.config.toolchain.clone());
        let lint_dir = self.config.lint_dir(&workspace_root);
        let state = match LintHost::new(
            Arc::new(SystemCargo),
            lint_dir,
            self.config.cache_dir.clone(),
            toolchain,
            self.config.check_timeout,
        ) {
            Ok(host) => {
                let pipeline = Arc::new(LanternPipeline::new(
                    workspace_root,
                    DetectorRegistry::with_builtins(),
                    host,
                ));
                let publisher: Arc<dyn Publisher> =
                    Arc::new(LspPublisher::new(self.client.clone()));
                ScanState::Ready(ScanController::spawn(pipeline, publisher))
            }
            Err(err) => {
                error!("cannot set up the scan pipeline: {err}");
                ScanState::Failed(err.to_string())
            }
        };
        *self.scan.lock().await = state;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                position_encoding: Some(PositionEncodingKind::UTF16),
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..TextDocumentSyncOptions::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        SCAN_WORKSPACE_COMMAND.to_string(),
                        RELOAD_DETECTORS_COMMAND.to_string(),
                    ],
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                }),
                ..ServerCapabilities::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        if let ScanState::Failed(detail) = &*self.scan.lock().await {
            LspPublisher::new(self.client.clone())
                .publish_status(ScanStatus::Error, detail)
                .await;
            return;
        }
        info!("client ready; starting the initial scan");
        self.trigger(ScanTrigger::Startup).await;
    }

    async fn shutdown(&self) -> JsonRpcResult<()> {
        info!("shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("opened {}", params.text_document.uri);
    }

    async fn did_change(&self, _params: DidChangeTextDocumentParams) {
        // Scans key off saves, not keystrokes.
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("closed {}", params.text_document.uri);
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        if path.extension().and_then(|ext| ext.to_str()) != Some("rs") {
            return;
        }
        debug!("rust source saved: {}", path.display());
        self.trigger(ScanTrigger::Save).await;
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> JsonRpcResult<Option<serde_json::Value>> {
        match params.command.as_str() {
            SCAN_WORKSPACE_COMMAND => {
                info!("manual workspace scan requested");
                self.trigger(ScanTrigger::Manual).await;
            }
            RELOAD_DETECTORS_COMMAND => {
                info!("detector reload requested");
                self.trigger(ScanTrigger::Reload).await;
            }
            other => warn!("unknown command {other:?}"),
        }
        Ok(None)
    }
}
