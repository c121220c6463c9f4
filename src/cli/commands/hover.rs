//! Hover command implementation
//!
//! Same text the language server returns for `textDocument/hover`.

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::{HoverResponse, LocationOutput};
use crate::server::Document;
use crate::server::handlers;

#[derive(Args, Debug)]
pub struct HoverArgs {
    /// File path with position (file:line:column)
    pub location: String,
}

pub async fn execute(args: HoverArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let loc = ParsedLocation::parse(&args.location)?.to_absolute()?;
    let source = app.read_source(&loc.file).await?;
    loc.validate_against(&source)?;

    let analysis = app.analyzer.analyze(&source);
    let doc = Document {
        version: 0,
        source,
        analysis,
    };

    let file = ctx.relative_path(&loc.file);
    let response = match handlers::hover(&doc, loc.position(), app.analyzer.reserved()) {
        Some(hover) => HoverResponse {
            content: Some(hover.contents.value),
            range: hover.range.map(|r| {
                let (line, column) = r.start.to_display();
                LocationOutput::new(file.as_str(), line, column)
            }),
            message: None,
        },
        None => HoverResponse {
            content: None,
            range: None,
            message: Some("No hover information available".to_string()),
        },
    };

    ctx.print_report(response, |r| {
        r.content
            .as_deref()
            .or(r.message.as_deref())
            .map(|text| text.lines().map(String::from).collect())
            .unwrap_or_default()
    });
    Ok(())
}
