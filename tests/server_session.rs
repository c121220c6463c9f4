//! `lantern serve` driven through a client session

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use lantern::error::SessionError;
use lantern::infra::lsp::LanguageServerSession;
use lantern::infra::lsp::protocol::{LspLocation, error_codes};
use lantern::models::lsp::Position;

const WAIT: Duration = Duration::from_secs(5);

async fn start(dir: &TempDir) -> std::sync::Arc<LanguageServerSession> {
    let session = LanguageServerSession::new(dir.path(), Duration::from_secs(10));
    session
        .start(
            env!("CARGO_BIN_EXE_lantern"),
            &["serve", "--override-policy", "abort"],
        )
        .await
        .expect("server starts");
    session
}

#[tokio::test]
async fn diagnostics_and_definition_round_trip() {
    let dir = TempDir::new().unwrap();
    let session = start(&dir).await;

    let info = session.capabilities().await.unwrap().server_info.unwrap();
    assert_eq!(info.name, "lantern");

    let text = "class A {\n    def f() {\n        return 1\n    }\n}\nA;\n";
    let uri = session
        .open_document(&dir.path().join("main.ln"), text)
        .await
        .unwrap();

    let diagnostics = session.wait_for_diagnostics(&uri, WAIT).await.unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].range.start.line, 2);

    let location: Option<LspLocation> = session
        .request(
            "textDocument/definition",
            Some(json!({
                "textDocument": { "uri": uri },
                "position": { "line": 5, "character": 0 }
            })),
        )
        .await
        .unwrap();
    assert_eq!(location.unwrap().range.start, Position::new(0, 6));

    session.stop().await.unwrap();
    assert!(!session.is_running().await);
}

#[tokio::test]
async fn gated_compile_is_refused_when_builtins_are_redefined() {
    let dir = TempDir::new().unwrap();
    let session = start(&dir).await;

    let path = dir.path().join("shadow.ln");
    let uri = session.open_document(&path, "print = 1;\n").await.unwrap();
    session.wait_for_diagnostics(&uri, WAIT).await.unwrap();

    let err = session
        .request::<serde_json::Value>(
            "workspace/executeCommand",
            Some(json!({ "command": "lantern.compile", "arguments": [uri] })),
        )
        .await
        .unwrap_err();
    match err {
        SessionError::Server { code, message } => {
            assert_eq!(code, error_codes::REQUEST_FAILED);
            assert!(message.contains("built-in"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The buffer is saved before the gate runs
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "print = 1;\n");

    session.stop().await.unwrap();
}
