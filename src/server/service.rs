//! Stdio language server loop
//!
//! Single task: messages are handled in arrival order, so a document change
//! is always analyzed before any request that follows it. Gated commands run
//! inline and hold the loop until the toolchain returns or times out.

use std::io;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};

use super::documents::DocumentStore;
use super::handlers;
use crate::analysis::Analyzer;
use crate::error::ToolchainError;
use crate::infra::lsp::protocol::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, ExecuteCommandParams, InitializeResult, Message, Notification,
    PublishDiagnosticsParams, Request, Response, ResponseError, ServerCapabilities, ServerInfo,
    TEXT_DOCUMENT_SYNC_FULL, TextDocumentIdentifier, TextDocumentPositionParams, error_codes,
};
use crate::infra::lsp::transport::{Transport, write_message};
use crate::models::lsp::uri_to_path;
use crate::services::config::ConfigService;
use crate::services::gate::{self, FixedPrompt, GateDecision, OverridePolicy, PromptChoice};
use crate::services::toolchain::{self, ToolOutput, ToolchainService};

pub const COMMAND_COMPILE: &str = "lantern.compile";
pub const COMMAND_CHECK: &str = "lantern.check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Uninitialized,
    Running,
    ShuttingDown,
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` after `shutdown`
    Clean,
    /// `exit` without `shutdown`, or the client closed the stream
    Abrupt,
}

pub struct LanguageServer {
    documents: DocumentStore,
    toolchain: Arc<dyn ToolchainService>,
    config_service: Arc<dyn ConfigService>,
    check_overrides: bool,
    prompt: FixedPrompt,
    state: ServerState,
}

impl LanguageServer {
    pub fn new(
        analyzer: Analyzer,
        toolchain: Arc<dyn ToolchainService>,
        config_service: Arc<dyn ConfigService>,
        check_overrides: bool,
        policy: OverridePolicy,
    ) -> Self {
        let prompt = FixedPrompt::from_policy(policy).unwrap_or_else(|| {
            tracing::warn!("Override policy 'ask' cannot prompt inside the server, using abort");
            FixedPrompt(PromptChoice::Abort)
        });

        Self {
            documents: DocumentStore::new(analyzer),
            toolchain,
            config_service,
            check_overrides,
            prompt,
            state: ServerState::Uninitialized,
        }
    }

    pub async fn run_stdio(self) -> io::Result<ExitReason> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(mut self, reader: R, mut writer: W) -> io::Result<ExitReason>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut transport = Transport::new(reader);
        tracing::info!("Language server listening on stdio");

        loop {
            let message = match transport.read_message().await {
                Ok(message) => message,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    tracing::warn!("Malformed message: {}", e);
                    let error = ResponseError::new(error_codes::PARSE_ERROR, e.to_string());
                    write_message(&mut writer, &Response::failure(None, error)).await?;
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::info!("Client closed the stream");
                    return Ok(ExitReason::Abrupt);
                }
                Err(e) => return Err(e),
            };

            match message {
                Message::Request(request) => {
                    let response = self.handle_request(request).await;
                    write_message(&mut writer, &response).await?;
                }
                Message::Notification(notification) => {
                    if notification.method == "exit" {
                        let reason = if self.state == ServerState::ShuttingDown {
                            ExitReason::Clean
                        } else {
                            ExitReason::Abrupt
                        };
                        tracing::info!("Language server exiting ({:?})", reason);
                        return Ok(reason);
                    }
                    self.handle_notification(notification, &mut writer).await?;
                }
                Message::Response(response) => {
                    tracing::debug!("Ignoring client response {:?}", response.id);
                }
            }
        }
    }

    async fn handle_request(&mut self, request: Request) -> Response {
        let Request {
            id, method, params, ..
        } = request;
        tracing::debug!("Request {:?}: {}", id, method);

        let result = match (self.state, method.as_str()) {
            (ServerState::Uninitialized, "initialize") => {
                self.state = ServerState::Running;
                to_value(initialize_result())
            }
            (ServerState::Uninitialized, _) => Err(ResponseError::new(
                error_codes::SERVER_NOT_INITIALIZED,
                "Server not initialized",
            )),
            (ServerState::ShuttingDown, _) => Err(ResponseError::new(
                error_codes::INVALID_REQUEST,
                "Server is shutting down",
            )),
            (ServerState::Running, "initialize") => Err(ResponseError::new(
                error_codes::INVALID_REQUEST,
                "Server already initialized",
            )),
            (ServerState::Running, "shutdown") => {
                self.state = ServerState::ShuttingDown;
                Ok(Value::Null)
            }
            (ServerState::Running, "textDocument/documentSymbol") => {
                self.document_symbol(params)
            }
            (ServerState::Running, "textDocument/definition") => self.definition(params),
            (ServerState::Running, "textDocument/hover") => self.hover(params),
            (ServerState::Running, "textDocument/completion") => self.completion(params),
            (ServerState::Running, "workspace/executeCommand") => {
                self.execute_command(params).await
            }
            (ServerState::Running, _) => Err(ResponseError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        };

        match result {
            Ok(value) => Response::success(id, value),
            Err(error) => Response::failure(Some(id), error),
        }
    }

    async fn handle_notification<W: AsyncWrite + Unpin>(
        &mut self,
        notification: Notification,
        writer: &mut W,
    ) -> io::Result<()> {
        if self.state != ServerState::Running {
            tracing::debug!("Dropping '{}' outside running state", notification.method);
            return Ok(());
        }

        let method = notification.method.as_str();
        let params = notification.params;
        match method {
            "initialized" => tracing::info!("Client initialized"),
            "textDocument/didOpen" => {
                if let Ok(p) = parse_params::<DidOpenTextDocumentParams>(params) {
                    let doc = p.text_document;
                    self.documents.upsert(&doc.uri, doc.version, doc.text);
                    self.publish(writer, &doc.uri).await?;
                }
            }
            "textDocument/didChange" => {
                if let Ok(p) = parse_params::<DidChangeTextDocumentParams>(params)
                    && let Some(change) = p.content_changes.into_iter().last()
                {
                    if change.range.is_some() {
                        tracing::warn!("Ranged change ignored, server only supports full sync");
                        return Ok(());
                    }
                    let uri = p.text_document.uri;
                    self.documents.upsert(&uri, p.text_document.version, change.text);
                    self.publish(writer, &uri).await?;
                }
            }
            "textDocument/didSave" => {
                if let Ok(p) = parse_params::<DidSaveTextDocumentParams>(params) {
                    let uri = p.text_document.uri;
                    if let Some(text) = p.text {
                        let version = self.documents.get(&uri).map_or(0, |d| d.version);
                        self.documents.upsert(&uri, version, text);
                    }
                    self.publish(writer, &uri).await?;
                }
            }
            "textDocument/didClose" => {
                if let Ok(p) = parse_params::<DidCloseTextDocumentParams>(params) {
                    let uri = p.text_document.uri;
                    self.documents.close(&uri);
                    // clear the client's markers for the closed document
                    let cleared = PublishDiagnosticsParams {
                        uri,
                        version: None,
                        diagnostics: Vec::new(),
                    };
                    send_notification(writer, "textDocument/publishDiagnostics", &cleared).await?;
                }
            }
            _ => tracing::trace!("Unhandled notification: {}", method),
        }
        Ok(())
    }

    async fn publish<W: AsyncWrite + Unpin>(&self, writer: &mut W, uri: &str) -> io::Result<()> {
        let Some(doc) = self.documents.get(uri) else {
            return Ok(());
        };
        let params = PublishDiagnosticsParams {
            uri: uri.to_string(),
            version: Some(doc.version),
            diagnostics: handlers::diagnostics(doc),
        };
        send_notification(writer, "textDocument/publishDiagnostics", &params).await
    }

    fn document_symbol(&self, params: Option<Value>) -> Result<Value, ResponseError> {
        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            text_document: TextDocumentIdentifier,
        }

        let p: Params = parse_params(params)?;
        match self.documents.get(&p.text_document.uri) {
            Some(doc) => to_value(handlers::document_symbols(doc)),
            None => Ok(Value::Null),
        }
    }

    fn definition(&self, params: Option<Value>) -> Result<Value, ResponseError> {
        let p: TextDocumentPositionParams = parse_params(params)?;
        let uri = p.text_document.uri;
        let location = self
            .documents
            .get(&uri)
            .and_then(|doc| handlers::definition(&uri, doc, p.position));
        to_value(location)
    }

    fn hover(&self, params: Option<Value>) -> Result<Value, ResponseError> {
        let p: TextDocumentPositionParams = parse_params(params)?;
        let reserved = self.documents.analyzer().reserved();
        let hover = self
            .documents
            .get(&p.text_document.uri)
            .and_then(|doc| handlers::hover(doc, p.position, reserved));
        to_value(hover)
    }

    fn completion(&self, params: Option<Value>) -> Result<Value, ResponseError> {
        let p: TextDocumentPositionParams = parse_params(params)?;
        let reserved = self.documents.analyzer().reserved();
        match self.documents.get(&p.text_document.uri) {
            Some(doc) => to_value(handlers::completion(doc, reserved)),
            None => Ok(Value::Null),
        }
    }

    async fn execute_command(&mut self, params: Option<Value>) -> Result<Value, ResponseError> {
        let p: ExecuteCommandParams = parse_params(params)?;
        let uri = command_uri(&p.arguments).ok_or_else(|| {
            ResponseError::new(
                error_codes::INVALID_PARAMS,
                format!("{} expects a document URI argument", p.command),
            )
        })?;

        let output = match p.command.as_str() {
            COMMAND_COMPILE | COMMAND_CHECK => self.run_gated(&p.command, &uri).await,
            other => {
                return Err(ResponseError::new(
                    error_codes::INVALID_PARAMS,
                    format!("Unknown command: {}", other),
                ));
            }
        };

        match output {
            Ok(output) => to_value(output),
            Err(e) => {
                tracing::warn!("{} failed: {}", p.command, e);
                Err(ResponseError::new(error_codes::REQUEST_FAILED, e.to_string()))
            }
        }
    }

    /// Save the buffer, consult the override gate, then invoke the tool
    async fn run_gated(&mut self, command: &str, uri: &str) -> Result<ToolOutput, ToolchainError> {
        let Some(doc) = self.documents.get(uri) else {
            return Err(ToolchainError::failed(command, format!("{} is not open", uri)));
        };

        let path = uri_to_path(uri);
        toolchain::save_buffer(command, &path, doc.source.as_str()).await?;

        let overrides = &doc.analysis.overrides;
        match gate::evaluate(overrides, self.check_overrides, &self.prompt) {
            GateDecision::Abort => {
                return Err(ToolchainError::Aborted(format!(
                    "{} redefines {} built-in name(s)",
                    path.display(),
                    overrides.len()
                )));
            }
            GateDecision::ProceedAndRemember => {
                self.check_overrides = false;
                if let Err(e) = self.config_service.suppress_override_check().await {
                    tracing::warn!("Failed to persist override setting: {}", e);
                }
            }
            GateDecision::Proceed | GateDecision::ProceedOnce => {}
        }

        if command == COMMAND_COMPILE {
            self.toolchain.compile(&path).await
        } else {
            self.toolchain.check(&path).await
        }
    }
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(serde_json::json!({
                "openClose": true,
                "change": TEXT_DOCUMENT_SYNC_FULL,
                "save": { "includeText": true }
            })),
            hover_provider: Some(Value::Bool(true)),
            definition_provider: Some(Value::Bool(true)),
            document_symbol_provider: Some(Value::Bool(true)),
            completion_provider: Some(serde_json::json!({ "resolveProvider": false })),
            execute_command_provider: Some(serde_json::json!({
                "commands": [COMMAND_COMPILE, COMMAND_CHECK]
            })),
        },
        server_info: Some(ServerInfo {
            name: "lantern".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    }
}

/// First argument as a bare URI string or `{ "uri": ... }`
fn command_uri(arguments: &[Value]) -> Option<String> {
    match arguments.first()? {
        Value::String(uri) => Some(uri.clone()),
        Value::Object(map) => map.get("uri")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, ResponseError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| ResponseError::new(error_codes::INVALID_PARAMS, e.to_string()))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, ResponseError> {
    serde_json::to_value(value)
        .map_err(|e| ResponseError::new(error_codes::INTERNAL_ERROR, e.to_string()))
}

async fn send_notification<W, P>(writer: &mut W, method: &str, params: &P) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    P: Serialize,
{
    let params = serde_json::to_value(params)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write_message(writer, &Notification::new(method, Some(params))).await
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::models::lsp::path_to_uri;
    use crate::services::config::DefaultConfigService;

    #[derive(Default)]
    struct RecordingToolchain {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ToolchainService for RecordingToolchain {
        async fn compile(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
            self.record("compile", path)
        }
        async fn check(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
            self.record("check", path)
        }
        async fn run(&self, path: &Path) -> Result<ToolOutput, ToolchainError> {
            self.record("run", path)
        }
    }

    impl RecordingToolchain {
        fn record(&self, tool: &str, path: &Path) -> Result<ToolOutput, ToolchainError> {
            self.calls.lock().unwrap().push(tool.to_string());
            Ok(ToolOutput {
                tool: tool.to_string(),
                status_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                artifact: Some(path.to_path_buf()),
            })
        }
    }

    struct Client {
        transport: Transport<ReadHalf<DuplexStream>>,
        writer: WriteHalf<DuplexStream>,
        next_id: u64,
        server: JoinHandle<io::Result<ExitReason>>,
    }

    impl Client {
        fn start(
            toolchain: Arc<RecordingToolchain>,
            root: &Path,
            policy: OverridePolicy,
        ) -> Self {
            let (client_io, server_io) = tokio::io::duplex(64 * 1024);
            let (server_read, server_write) = tokio::io::split(server_io);
            let (client_read, client_write) = tokio::io::split(client_io);

            let server = LanguageServer::new(
                Analyzer::default(),
                toolchain,
                Arc::new(DefaultConfigService::new(root)),
                true,
                policy,
            );
            Self {
                transport: Transport::new(client_read),
                writer: client_write,
                next_id: 1,
                server: tokio::spawn(server.serve(server_read, server_write)),
            }
        }

        async fn request(&mut self, method: &str, params: Value) -> Response {
            let id = self.next_id;
            self.next_id += 1;
            write_message(&mut self.writer, &Request::new(id, method, Some(params)))
                .await
                .unwrap();
            loop {
                if let Message::Response(r) = self.transport.read_message().await.unwrap() {
                    return r;
                }
            }
        }

        async fn notify(&mut self, method: &str, params: Value) {
            write_message(&mut self.writer, &Notification::new(method, Some(params)))
                .await
                .unwrap();
        }

        async fn next_diagnostics(&mut self) -> PublishDiagnosticsParams {
            match self.transport.read_message().await.unwrap() {
                Message::Notification(n) if n.method == "textDocument/publishDiagnostics" => {
                    serde_json::from_value(n.params.unwrap()).unwrap()
                }
                other => panic!("expected diagnostics, got {other:?}"),
            }
        }

        async fn initialize(&mut self) {
            let resp = self.request("initialize", serde_json::json!({})).await;
            assert!(resp.is_success());
            self.notify("initialized", serde_json::json!({})).await;
        }

        async fn open(&mut self, uri: &str, text: &str) -> PublishDiagnosticsParams {
            self.notify(
                "textDocument/didOpen",
                serde_json::json!({
                    "textDocument": {"uri": uri, "languageId": "lantern", "version": 1, "text": text}
                }),
            )
            .await;
            self.next_diagnostics().await
        }

        async fn finish(mut self) -> ExitReason {
            let resp = self.request("shutdown", Value::Null).await;
            assert!(resp.is_success());
            self.notify("exit", Value::Null).await;
            self.server.await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_requires_initialize() {
        let temp = TempDir::new().unwrap();
        let mut client = Client::start(Arc::default(), temp.path(), OverridePolicy::Abort);

        let resp = client
            .request("textDocument/hover", serde_json::json!({}))
            .await;
        assert_eq!(resp.error.unwrap().code, error_codes::SERVER_NOT_INITIALIZED);

        client.initialize().await;
        let resp = client.request("textDocument/formatting", Value::Null).await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        assert_eq!(client.finish().await, ExitReason::Clean);
    }

    #[tokio::test]
    async fn test_diagnostics_follow_document_lifecycle() {
        let temp = TempDir::new().unwrap();
        let mut client = Client::start(Arc::default(), temp.path(), OverridePolicy::Abort);
        client.initialize().await;

        let uri = "file:///tmp/life.ln";
        let published = client.open(uri, "x = 1\ny = 2;").await;
        assert_eq!(published.diagnostics.len(), 1);
        assert_eq!(published.version, Some(1));

        client
            .notify(
                "textDocument/didChange",
                serde_json::json!({
                    "textDocument": {"uri": uri, "version": 2},
                    "contentChanges": [{"text": "x = 1;\ny = 2;"}]
                }),
            )
            .await;
        let published = client.next_diagnostics().await;
        assert!(published.diagnostics.is_empty());
        assert_eq!(published.version, Some(2));

        client
            .notify(
                "textDocument/didClose",
                serde_json::json!({"textDocument": {"uri": uri}}),
            )
            .await;
        assert!(client.next_diagnostics().await.diagnostics.is_empty());

        assert_eq!(client.finish().await, ExitReason::Clean);
    }

    #[tokio::test]
    async fn test_language_features() {
        let temp = TempDir::new().unwrap();
        let mut client = Client::start(Arc::default(), temp.path(), OverridePolicy::Abort);
        client.initialize().await;

        let uri = "file:///tmp/feat.ln";
        client
            .open(uri, "class Dog {\n  def bark() {\n  }\n}\nDog;\n")
            .await;

        let symbols = client
            .request(
                "textDocument/documentSymbol",
                serde_json::json!({"textDocument": {"uri": uri}}),
            )
            .await
            .into_result()
            .unwrap();
        assert_eq!(symbols.as_array().unwrap().len(), 2);
        assert_eq!(symbols[0]["kind"], 5);

        let position = serde_json::json!({"textDocument": {"uri": uri}, "position": {"line": 4, "character": 1}});
        let def = client
            .request("textDocument/definition", position.clone())
            .await
            .into_result()
            .unwrap();
        assert_eq!(def["range"]["start"]["line"], 0);
        assert_eq!(def["range"]["start"]["character"], 6);

        let hover = client
            .request("textDocument/hover", position.clone())
            .await
            .into_result()
            .unwrap();
        assert!(hover["contents"]["value"].as_str().unwrap().contains("class Dog"));

        let items = client
            .request("textDocument/completion", position)
            .await
            .into_result()
            .unwrap();
        assert_eq!(items[0]["label"], "Dog");

        client.finish().await;
    }

    #[tokio::test]
    async fn test_execute_command_gated_by_policy() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prog.ln");
        let uri = path_to_uri(&path);

        let toolchain = Arc::new(RecordingToolchain::default());
        let mut client = Client::start(toolchain.clone(), temp.path(), OverridePolicy::Abort);
        client.initialize().await;
        client.open(&uri, "def print(x) {\n}\n").await;

        let resp = client
            .request(
                "workspace/executeCommand",
                serde_json::json!({"command": COMMAND_COMPILE, "arguments": [uri]}),
            )
            .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::REQUEST_FAILED);
        assert!(err.message.starts_with("Aborted"));
        assert!(toolchain.calls.lock().unwrap().is_empty());
        // the buffer is saved before the gate runs
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "def print(x) {\n}\n"
        );

        client.finish().await;
    }

    #[tokio::test]
    async fn test_execute_command_remember_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prog.ln");
        let uri = path_to_uri(&path);

        let toolchain = Arc::new(RecordingToolchain::default());
        let mut client = Client::start(toolchain.clone(), temp.path(), OverridePolicy::Remember);
        client.initialize().await;
        client.open(&uri, "len = 5;\n").await;

        let resp = client
            .request(
                "workspace/executeCommand",
                serde_json::json!({"command": COMMAND_CHECK, "arguments": [{"uri": uri}]}),
            )
            .await;
        assert!(resp.is_success());
        assert_eq!(*toolchain.calls.lock().unwrap(), vec!["check".to_string()]);

        let saved = std::fs::read_to_string(temp.path().join(".lantern/config.toml")).unwrap();
        assert!(saved.contains("check_builtin_overrides = false"));

        client.finish().await;
    }

    #[tokio::test]
    async fn test_exit_without_shutdown_is_abrupt() {
        let temp = TempDir::new().unwrap();
        let mut client = Client::start(Arc::default(), temp.path(), OverridePolicy::Abort);
        client.initialize().await;
        client.notify("exit", Value::Null).await;
        assert_eq!(client.server.await.unwrap().unwrap(), ExitReason::Abrupt);
    }

    #[test]
    fn test_command_uri_forms() {
        assert_eq!(
            command_uri(&[Value::String("file:///a.ln".into())]).as_deref(),
            Some("file:///a.ln")
        );
        assert_eq!(
            command_uri(&[serde_json::json!({"uri": "file:///b.ln"})]).as_deref(),
            Some("file:///b.ln")
        );
        assert!(command_uri(&[]).is_none());
        assert!(command_uri(&[serde_json::json!(3)]).is_none());
    }
}
