use tower_lsp::{ClientSocket, LspService, Server};

use crate::backend::Backend;
use crate::config::ServerConfig;

/// Builds the LSP service around the standard backend.
pub fn create_service(config: ServerConfig) -> (LspService<Backend>, ClientSocket) {
    LspService::new(|client| Backend::new(client, config))
}

/// Serves LSP over stdio until the client disconnects.
pub async fn start_server(config: ServerConfig) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = create_service(config);
    Server::new(stdin, stdout, socket).serve(service).await;
}
