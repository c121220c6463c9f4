//! Doctor command - toolchain and language server health check

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::json;

use crate::app::App;
use crate::infra::lsp::LanguageServerSession;
use crate::infra::lsp::protocol::DocumentSymbol;

const SESSION_TIMEOUT: Duration = Duration::from_secs(10);
const DIAGNOSTICS_WAIT: Duration = Duration::from_secs(5);

/// Sample with one class, one function and one missing terminator
const SAMPLE_SOURCE: &str = "class Sample {\n    def ping() {\n        return 1\n    }\n}\n";

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Skip the language server round trip
    #[arg(long)]
    pub skip_server: bool,
}

#[derive(Serialize)]
struct DoctorResponse {
    healthy: bool,
    tools: Vec<ToolEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<ServerEntry>,
}

#[derive(Serialize)]
struct ToolEntry {
    role: &'static str,
    command: String,
    installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Default)]
struct ServerEntry {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_version: Option<String>,
    symbols: usize,
    diagnostics: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Locate `command` the way a shell would: as a path when it contains a
/// separator, otherwise on `PATH`
fn find_executable(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(command))
        .find(|path| path.is_file())
}

fn tool_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

fn check_tool(role: &'static str, command: &str) -> ToolEntry {
    let path = find_executable(command);
    ToolEntry {
        role,
        command: command.to_string(),
        installed: path.is_some(),
        version: path.as_deref().and_then(tool_version),
        path: path.map(|p| p.display().to_string()),
    }
}

/// Start `lantern serve`, open a sample document and wait for its outline
/// and diagnostics
async fn check_server(root: &Path, expected_diagnostics: usize) -> ServerEntry {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            return ServerEntry {
                error: Some(format!("Cannot locate lantern executable: {}", e)),
                ..Default::default()
            };
        }
    };

    let session = LanguageServerSession::new(root, SESSION_TIMEOUT);
    let exe = exe.display().to_string();
    let result = exercise_server(&session, &exe, root, expected_diagnostics).await;
    if let Err(e) = session.stop().await {
        tracing::debug!("Doctor session stop: {}", e);
    }

    match result {
        Ok(entry) => entry,
        Err(e) => ServerEntry {
            error: Some(e.to_string()),
            ..Default::default()
        },
    }
}

async fn exercise_server(
    session: &std::sync::Arc<LanguageServerSession>,
    exe: &str,
    root: &Path,
    expected_diagnostics: usize,
) -> Result<ServerEntry> {
    session.start(exe, &["serve", "--override-policy", "abort"]).await?;

    let uri = session
        .open_document(&root.join("doctor-sample.ln"), SAMPLE_SOURCE)
        .await?;
    let diagnostics = session
        .wait_for_diagnostics(&uri, DIAGNOSTICS_WAIT)
        .await
        .ok_or_else(|| anyhow::anyhow!("No diagnostics published for the sample document"))?;
    let symbols: Vec<DocumentSymbol> = session
        .request(
            "textDocument/documentSymbol",
            Some(json!({ "textDocument": { "uri": uri } })),
        )
        .await?;

    let server_version = session
        .capabilities()
        .await
        .and_then(|c| c.server_info)
        .and_then(|info| info.version);

    Ok(ServerEntry {
        ok: symbols.len() == 2 && diagnostics.len() == expected_diagnostics,
        server_version,
        symbols: symbols.len(),
        diagnostics: diagnostics.len(),
        error: None,
    })
}

pub async fn execute(args: DoctorArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let toolchain = &app.config.toolchain;

    let tools = vec![
        check_tool("compiler", &toolchain.compiler),
        check_tool("checker", toolchain.checker()),
        check_tool("runner", &toolchain.runner),
    ];

    let server = if args.skip_server {
        None
    } else {
        // analysis.lint = false silences the sample's one warning
        let expected = usize::from(app.config.analysis.lint);
        Some(check_server(app.root(), expected).await)
    };

    let healthy = tools.iter().all(|t| t.installed) && server.as_ref().is_none_or(|s| s.ok);
    let response = DoctorResponse {
        healthy,
        tools,
        server,
    };

    ctx.print_report(response, |r| {
        let mut lines: Vec<String> = r
            .tools
            .iter()
            .map(|t| {
                let status = if t.installed { "ok" } else { "missing" };
                format!("{:<9} {:<16} {}", t.role, t.command, status)
            })
            .collect();
        if let Some(server) = &r.server {
            let status = match &server.error {
                Some(error) => format!("failed: {error}"),
                None if server.ok => "ok".to_string(),
                None => format!(
                    "unexpected result ({} symbols, {} diagnostics)",
                    server.symbols, server.diagnostics
                ),
            };
            lines.push(format!("{:<9} {:<16} {}", "server", "lantern serve", status));
        }
        lines
    });
    Ok(())
}
