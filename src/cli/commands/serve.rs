//! Serve command implementation
//!
//! stdout belongs to the protocol stream once the server starts; nothing
//! else may print there.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::server::{ExitReason, LanguageServer};
use crate::services::gate::OverridePolicy;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Answer for gated commands: proceed, remember or abort
    /// (default: server.override_policy from config)
    #[arg(long, value_name = "POLICY")]
    pub override_policy: Option<OverridePolicy>,
}

pub async fn execute(args: ServeArgs, app: &App) -> Result<ExitReason> {
    let policy = match args.override_policy {
        Some(policy) => policy,
        None => app
            .config
            .server
            .override_policy
            .parse()
            .map_err(anyhow::Error::msg)?,
    };

    let server = LanguageServer::new(
        app.analyzer.clone(),
        Arc::clone(&app.toolchain),
        Arc::clone(&app.config_service),
        app.config.safety.check_builtin_overrides,
        policy,
    );

    let reason = server.run_stdio().await?;
    tracing::info!("Language server exited ({:?})", reason);
    Ok(reason)
}
