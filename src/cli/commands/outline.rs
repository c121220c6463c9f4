//! Outline command implementation
//!
//! Lists every declaration in a file, in source order.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::analysis::SymbolTable;
use crate::app::App;
use crate::cli::response::{SymbolOutput, SymbolsResponse};
use crate::models::symbol::SymbolKind;

#[derive(Args, Debug)]
pub struct OutlineArgs {
    /// Source file
    pub file: PathBuf,

    /// Only this kind (class, interface, function)
    #[arg(short, long)]
    pub kind: Option<SymbolKind>,
}

pub async fn execute(args: OutlineArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let source = match app.read_source(&args.file).await {
        Ok(source) => source,
        Err(e) => {
            ctx.print_error(&e.to_string());
            return Ok(());
        }
    };

    let file = ctx.relative_path(&app.resolve(&args.file));
    let table = SymbolTable::build(&source);
    let symbols: Vec<SymbolOutput> = match args.kind {
        Some(kind) => table
            .filter_by_kind(kind)
            .map(|s| SymbolOutput::from_symbol(s, &file, &source))
            .collect(),
        None => table
            .symbols()
            .iter()
            .map(|s| SymbolOutput::from_symbol(s, &file, &source))
            .collect(),
    };

    let response = SymbolsResponse {
        file,
        count: symbols.len(),
        symbols,
    };
    ctx.print_report(response, |r| {
        r.symbols
            .iter()
            .map(|s| {
                format!(
                    "{}:{}:{}: {} {}{}",
                    s.location.file,
                    s.location.line,
                    s.location.column,
                    s.kind,
                    s.name,
                    if s.closed { "" } else { " (unclosed)" }
                )
            })
            .collect()
    });
    Ok(())
}
