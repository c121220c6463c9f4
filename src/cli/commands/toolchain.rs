//! Compile, check and run commands
//!
//! All three pass through the override gate before the external tool is
//! started.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::error::ToolchainError;
use crate::models::shadowing::Override;
use crate::services::gate::{
    self, FixedPrompt, GateDecision, OverridePolicy, OverridePrompt, TerminalPrompt,
};
use crate::services::toolchain::ToolOutput;

#[derive(Args, Debug)]
pub struct ToolArgs {
    /// Source file
    pub file: PathBuf,

    /// Answer when the file redefines built-in names: ask, proceed,
    /// remember or abort (default: ask on a terminal, abort otherwise)
    #[arg(long, value_name = "POLICY")]
    pub on_override: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Compile,
    Check,
    Run,
}

#[derive(Serialize)]
struct ToolResponse {
    file: String,
    command: Tool,
    decision: GateDecision,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    overrides: Vec<Override>,
    #[serde(flatten)]
    output: ToolOutput,
}

fn resolve_policy(arg: Option<&str>, interactive: bool) -> Result<OverridePolicy> {
    match arg {
        Some(value) => value.parse().map_err(anyhow::Error::msg),
        None if interactive => Ok(OverridePolicy::Ask),
        None => Ok(OverridePolicy::Abort),
    }
}

/// Run the gate on a blocking thread; the terminal prompt waits on stdin
async fn decide(
    overrides: Vec<Override>,
    check_enabled: bool,
    policy: OverridePolicy,
) -> Result<(GateDecision, Vec<Override>)> {
    let prompt: Box<dyn OverridePrompt + Send> = match FixedPrompt::from_policy(policy) {
        Some(fixed) => Box::new(fixed),
        None => Box::new(TerminalPrompt),
    };
    let decided = tokio::task::spawn_blocking(move || {
        let decision = gate::evaluate(&overrides, check_enabled, prompt.as_ref());
        (decision, overrides)
    })
    .await?;
    Ok(decided)
}

pub async fn execute(tool: Tool, args: ToolArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let policy = resolve_policy(args.on_override.as_deref(), std::io::stdin().is_terminal())?;

    let path = app.resolve(&args.file);
    let source = app.read_source(&path).await?;
    let overrides = app.analyzer.overrides(&source);

    let (decision, overrides) =
        decide(overrides, app.config.safety.check_builtin_overrides, policy).await?;

    match decision {
        GateDecision::Abort => {
            return Err(anyhow!(ToolchainError::Aborted(format!(
                "{} redefines {} built-in name(s): {}",
                ctx.relative_path(&path),
                overrides.len(),
                overrides
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))));
        }
        GateDecision::ProceedAndRemember => {
            match app.config_service.suppress_override_check().await {
                Ok(config) => tracing::info!("Override check disabled in {}", config.display()),
                Err(e) => tracing::warn!("Failed to persist override setting: {}", e),
            }
        }
        GateDecision::Proceed | GateDecision::ProceedOnce => {}
    }

    let output = match tool {
        Tool::Compile => app.toolchain.compile(&path).await?,
        Tool::Check => app.toolchain.check(&path).await?,
        Tool::Run => app.toolchain.run(&path).await?,
    };

    let response = ToolResponse {
        file: ctx.relative_path(&path),
        command: tool,
        decision,
        overrides,
        output,
    };
    ctx.print_report(response, |r| {
        let mut lines: Vec<String> = r.output.stdout.lines().map(String::from).collect();
        if let Some(artifact) = &r.output.artifact {
            lines.push(format!("wrote {}", artifact.display()));
        }
        lines
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shadowing::OverrideKind;

    #[test]
    fn test_resolve_policy_defaults() {
        assert_eq!(resolve_policy(None, true).unwrap(), OverridePolicy::Ask);
        assert_eq!(resolve_policy(None, false).unwrap(), OverridePolicy::Abort);
        assert_eq!(
            resolve_policy(Some("remember"), false).unwrap(),
            OverridePolicy::Remember
        );
        assert!(resolve_policy(Some("maybe"), true).is_err());
    }

    #[tokio::test]
    async fn test_decide_with_fixed_policy() {
        let overrides = vec![Override::new("print", 1, OverrideKind::Assignment)];

        let (decision, kept) = decide(overrides.clone(), true, OverridePolicy::Abort)
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Abort);
        assert_eq!(kept, overrides);

        let (decision, _) = decide(overrides.clone(), true, OverridePolicy::Remember)
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::ProceedAndRemember);

        let (decision, _) = decide(overrides, false, OverridePolicy::Ask).await.unwrap();
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[test]
    fn test_response_flattens_tool_output() {
        let response = ToolResponse {
            file: "a.ln".to_string(),
            command: Tool::Compile,
            decision: GateDecision::Proceed,
            overrides: Vec::new(),
            output: ToolOutput {
                tool: "lanternc".to_string(),
                status_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                artifact: Some(PathBuf::from("a.out")),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["command"], "compile");
        assert_eq!(json["tool"], "lanternc");
        assert_eq!(json["decision"], "proceed");
        assert_eq!(json["artifact"], "a.out");
        assert!(json.get("overrides").is_none());
    }
}
