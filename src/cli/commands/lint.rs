//! Lint command implementation
//!
//! Checks one file or every source file below a directory. Findings follow
//! `analysis.lint`, so a disabled lint reports nothing.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Args;

use crate::analysis::{Analyzer, SourceText};
use crate::app::App;
use crate::cli::response::{DiagnosticOutput, FileDiagnostics, LintResponse};
use crate::infra::SourceFileFilter;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// File or directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Also lint files excluded by .gitignore
    #[arg(long)]
    pub no_ignore: bool,

    /// Include files without findings in the output
    #[arg(long)]
    pub all: bool,
}

pub async fn execute(args: LintArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let root = app.resolve(&args.path);
    if !root.exists() {
        bail!("Path not found: {}", root.display());
    }

    let analysis = &app.config.analysis;
    let files = SourceFileFilter::new(&analysis.extensions, analysis.max_file_size_bytes())
        .respect_gitignore(!args.no_ignore)
        .discover(&root);

    let mut results = Vec::new();
    let mut checked = 0;
    let mut total = 0;
    for path in &files {
        let diagnostics = match lint_file(&app.analyzer, path).await {
            Ok(diagnostics) => diagnostics,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        checked += 1;
        total += diagnostics.len();

        if args.all || !diagnostics.is_empty() {
            results.push(FileDiagnostics {
                file: ctx.relative_path(path),
                count: diagnostics.len(),
                diagnostics,
            });
        }
    }

    let response = LintResponse {
        files_checked: checked,
        total,
        files: results,
    };
    ctx.print_report(response, |r| {
        r.files
            .iter()
            .flat_map(|f| {
                f.diagnostics.iter().map(move |d| {
                    format!(
                        "{}:{}:{}: {}: {} [{}]",
                        f.file, d.line, d.column, d.severity, d.message, d.code
                    )
                })
            })
            .collect()
    });
    Ok(())
}

async fn lint_file(analyzer: &Analyzer, path: &Path) -> std::io::Result<Vec<DiagnosticOutput>> {
    let bytes = tokio::fs::read(path).await?;
    let source = SourceText::from_bytes(&bytes);
    Ok(analyzer
        .diagnostics(&source)
        .iter()
        .map(DiagnosticOutput::from)
        .collect())
}
