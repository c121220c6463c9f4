//! Shadows command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::response::OverridesResponse;

#[derive(Args, Debug)]
pub struct ShadowsArgs {
    /// Source file
    pub file: PathBuf,
}

pub async fn execute(args: ShadowsArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let source = app.read_source(&args.file).await?;
    let overrides = app.analyzer.overrides(&source);

    let response = OverridesResponse {
        file: ctx.relative_path(&app.resolve(&args.file)),
        count: overrides.len(),
        overrides,
    };
    ctx.print_report(response, |r| {
        r.overrides
            .iter()
            .map(|o| format!("{}:{}: '{}' redefined by {}", r.file, o.line_number, o.name, o.kind))
            .collect()
    });
    Ok(())
}
