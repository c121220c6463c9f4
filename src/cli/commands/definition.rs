//! Definition command implementation
//!
//! Resolves the word under the cursor to a declaration in the same file.

use anyhow::Result;
use clap::Args;

use crate::analysis::SymbolTable;
use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::{DefinitionResponse, SymbolOutput};

#[derive(Args, Debug)]
pub struct DefinitionArgs {
    /// File path with position (file:line:column)
    pub location: String,
}

pub async fn execute(args: DefinitionArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let loc = ParsedLocation::parse(&args.location)?.to_absolute()?;
    let source = app.read_source(&loc.file).await?;
    loc.validate_against(&source)?;

    let file = ctx.relative_path(&loc.file);
    let table = SymbolTable::build(&source);
    let response = match table.definition_at(&source, loc.position()) {
        Some(symbol) => DefinitionResponse {
            definition: Some(SymbolOutput::from_symbol(symbol, &file, &source)),
            message: None,
        },
        None => DefinitionResponse {
            definition: None,
            message: Some(format!("No declaration found at {}", loc)),
        },
    };

    ctx.print_report(response, |r| match &r.definition {
        Some(d) => vec![format!(
            "{}:{}:{}: {}",
            d.location.file, d.location.line, d.location.column, d.signature
        )],
        None => r.message.iter().cloned().collect(),
    });
    Ok(())
}
