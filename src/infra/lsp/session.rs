//! Client side of a language server conversation
//!
//! Spawns a server process, performs the initialize handshake and then
//! correlates requests with responses by id. Diagnostics pushed by the
//! server are cached per document URI.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, RwLock, oneshot, watch};
use tokio::time::timeout;

use super::protocol::{
    ClientInfo, DidOpenTextDocumentParams, InitializeParams, InitializeResult, LspDiagnostic,
    Message, Notification, PublishDiagnosticsParams, Request, RequestId, Response, ResponseError,
    TextDocumentItem, error_codes,
};
use super::transport::{Transport, write_message};
use crate::error::SessionError;
use crate::models::lsp::path_to_uri;

type PendingRequest = oneshot::Sender<Response>;

const SHUTDOWN_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const PROCESS_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LanguageServerSession {
    root: PathBuf,
    request_timeout: Duration,
    process: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    next_id: AtomicU64,
    pending: RwLock<HashMap<RequestId, PendingRequest>>,
    diagnostics: RwLock<HashMap<String, Vec<LspDiagnostic>>>,
    diagnostics_seen: watch::Sender<u64>,
    capabilities: RwLock<Option<InitializeResult>>,
    shutdown: AtomicBool,
    terminated: AtomicBool,
}

impl LanguageServerSession {
    pub fn new(root: impl Into<PathBuf>, request_timeout: Duration) -> Arc<Self> {
        let (diagnostics_seen, _) = watch::channel(0);
        Arc::new(Self {
            root: root.into(),
            request_timeout,
            process: Mutex::new(None),
            stdin: Mutex::new(None),
            next_id: AtomicU64::new(1),
            pending: RwLock::new(HashMap::new()),
            diagnostics: RwLock::new(HashMap::new()),
            diagnostics_seen,
            capabilities: RwLock::new(None),
            shutdown: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        })
    }

    /// Spawn the server and complete the initialize handshake
    pub async fn start(self: &Arc<Self>, command: &str, args: &[&str]) -> Result<(), SessionError> {
        if self.is_running().await {
            return Ok(());
        }

        tracing::info!("Starting language server: {} {:?}", command, args);

        let mut child = Command::new(command)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SessionError::Start(format!("{}: {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::Start("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Start("Failed to get stdout".to_string()))?;

        *self.process.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);
        self.shutdown.store(false, Ordering::Release);
        self.terminated.store(false, Ordering::Release);

        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.read_messages(Transport::new(stdout)).await;
        });

        self.initialize().await?;

        tracing::info!("Language server session started");
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        match process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn initialize(&self) -> Result<(), SessionError> {
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri: Some(path_to_uri(&self.root)),
            capabilities: serde_json::json!({
                "textDocument": {
                    "synchronization": { "didSave": true },
                    "hover": { "contentFormat": ["markdown", "plaintext"] },
                    "publishDiagnostics": {}
                }
            }),
            client_info: Some(ClientInfo {
                name: "lantern".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        };

        let result: InitializeResult = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        *self.capabilities.write().await = Some(result);

        self.notify("initialized", Some(serde_json::json!({})))
            .await
    }

    /// Send a request and wait for its response
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, SessionError> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(SessionError::Terminated);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(RequestId::Number(id), tx);

        tracing::trace!("LSP request {}: {}", id, method);

        {
            let mut stdin_guard = self.stdin.lock().await;
            let Some(stdin) = stdin_guard.as_mut() else {
                self.pending.write().await.remove(&RequestId::Number(id));
                return Err(SessionError::NotConnected);
            };
            write_message(stdin, &Request::new(id, method, params)).await?;
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => {
                let result = response.into_result()?;
                Ok(serde_json::from_value(result)?)
            }
            // sender dropped: the reader hit end of stream
            Ok(Err(_)) => Err(SessionError::Terminated),
            Err(_) => {
                self.pending.write().await.remove(&RequestId::Number(id));
                Err(SessionError::Timeout {
                    method: method.to_string(),
                    timeout: self.request_timeout,
                })
            }
        }
    }

    /// Send a notification (no response expected)
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), SessionError> {
        let mut stdin_guard = self.stdin.lock().await;
        let stdin = stdin_guard.as_mut().ok_or(SessionError::NotConnected)?;
        write_message(stdin, &Notification::new(method, params)).await?;
        Ok(())
    }

    pub async fn open_document(&self, path: &Path, text: &str) -> Result<String, SessionError> {
        let uri = path_to_uri(path);
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: "lantern".to_string(),
                version: 1,
                text: text.to_string(),
            },
        };
        self.notify(
            "textDocument/didOpen",
            Some(serde_json::to_value(params)?),
        )
        .await?;
        Ok(uri)
    }

    async fn read_messages<R: AsyncRead + Unpin>(self: Arc<Self>, mut transport: Transport<R>) {
        loop {
            match transport.read_message().await {
                Ok(message) => self.handle_message(message).await,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!("Discarding malformed LSP message: {}", e);
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Acquire) {
                        tracing::error!("LSP read error: {}", e);
                    }
                    break;
                }
            }
        }

        self.terminated.store(true, Ordering::Release);
        let mut pending = self.pending.write().await;
        if !pending.is_empty() {
            tracing::debug!("Dropping {} pending requests", pending.len());
        }
        pending.clear();
    }

    async fn handle_message(&self, message: Message) {
        match message {
            Message::Response(response) => {
                let Some(id) = response.id.clone() else {
                    tracing::debug!("Response without id: {:?}", response.error);
                    return;
                };
                match self.pending.write().await.remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => {
                        tracing::debug!("Response for unknown request ID {:?}", id);
                    }
                }
            }
            Message::Request(request) => {
                tracing::debug!("Unhandled server request: {}", request.method);
                let response = Response::failure(
                    Some(request.id),
                    ResponseError::new(
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method not found: {}", request.method),
                    ),
                );
                if let Ok(mut stdin_guard) = self.stdin.try_lock()
                    && let Some(stdin) = stdin_guard.as_mut()
                {
                    let _ = write_message(stdin, &response).await;
                }
            }
            Message::Notification(notification) => match notification.method.as_str() {
                "textDocument/publishDiagnostics" => {
                    let Some(params) = notification.params else {
                        return;
                    };
                    match serde_json::from_value::<PublishDiagnosticsParams>(params) {
                        Ok(published) => {
                            tracing::debug!(
                                "Cached {} diagnostics for {}",
                                published.diagnostics.len(),
                                published.uri
                            );
                            self.diagnostics
                                .write()
                                .await
                                .insert(published.uri, published.diagnostics);
                            self.diagnostics_seen.send_modify(|n| *n += 1);
                        }
                        Err(e) => tracing::debug!("Bad publishDiagnostics payload: {}", e),
                    }
                }
                method => tracing::trace!("Unhandled notification: {}", method),
            },
        }
    }

    pub async fn capabilities(&self) -> Option<InitializeResult> {
        self.capabilities.read().await.clone()
    }

    pub async fn diagnostics_for(&self, uri: &str) -> Option<Vec<LspDiagnostic>> {
        self.diagnostics.read().await.get(uri).cloned()
    }

    /// Wait until the server has published diagnostics for `uri`
    pub async fn wait_for_diagnostics(
        &self,
        uri: &str,
        wait: Duration,
    ) -> Option<Vec<LspDiagnostic>> {
        let mut seen = self.diagnostics_seen.subscribe();
        timeout(wait, async {
            loop {
                if let Some(diags) = self.diagnostics_for(uri).await {
                    return Some(diags);
                }
                if seen.changed().await.is_err() {
                    return None;
                }
            }
        })
        .await
        .ok()
        .flatten()
    }

    /// Shut the server down: `shutdown` request, `exit`, then kill if needed
    pub async fn stop(&self) -> Result<(), SessionError> {
        self.shutdown.store(true, Ordering::Release);

        let acknowledged = timeout(SHUTDOWN_REQUEST_TIMEOUT, self.request::<Value>("shutdown", None))
            .await
            .is_ok_and(|r| r.is_ok());
        if acknowledged {
            let _ = self.notify("exit", None).await;
        } else {
            tracing::debug!("Language server did not acknowledge shutdown");
        }

        self.stdin.lock().await.take();

        if let Some(mut child) = self.process.lock().await.take() {
            match timeout(PROCESS_EXIT_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => tracing::debug!("Language server exited: {:?}", status),
                Ok(Err(e)) => tracing::warn!("Language server wait error: {}", e),
                Err(_) => {
                    tracing::warn!("Language server termination timed out, forcing kill");
                    let _ = child.kill().await;
                }
            }
        }

        self.pending.write().await.clear();
        tracing::info!("Language server session stopped");
        Ok(())
    }
}

impl Drop for LanguageServerSession {
    fn drop(&mut self) {
        if let Ok(mut process_guard) = self.process.try_lock()
            && let Some(child) = process_guard.as_mut()
        {
            let _ = child.start_kill();
        }
    }
}
