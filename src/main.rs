//! Lantern - source analysis and editor support for the Lantern language
//!
//! Outline, lint and built-in shadowing checks from the command line, plus
//! a language server for editors.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lantern::app::App;
use lantern::cli::commands::toolchain::Tool;
use lantern::cli::output::{error_json, print_json};
use lantern::cli::{Cli, Commands};
use lantern::server::ExitReason;

fn main() {
    let cli = Cli::parse();

    // stdout carries JSON output or the LSP stream, so logs go to stderr.
    // Use RUST_LOG=lantern=debug for verbose output
    let default_filter = if cli.verbose {
        "lantern=debug"
    } else {
        "lantern=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            print_json(&error_json(&format!("Failed to create runtime: {e}")));
            std::process::exit(1);
        }
    };

    match runtime.block_on(async_main(cli)) {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            // All errors are output as JSON for consistent consumption
            print_json(&error_json(&format!("{e:#}")));
            std::process::exit(2);
        }
    }
}

async fn async_main(cli: Cli) -> anyhow::Result<i32> {
    let app = App::new(cli.format.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    execute_command(cli.command, &app).await
}

async fn execute_command(command: Commands, app: &App) -> anyhow::Result<i32> {
    use lantern::cli::commands;

    match command {
        // Analysis
        Commands::Outline(args) => commands::outline::execute(args, app).await?,
        Commands::Definition(args) => commands::definition::execute(args, app).await?,
        Commands::Hover(args) => commands::hover::execute(args, app).await?,
        Commands::Lint(args) => commands::lint::execute(args, app).await?,
        Commands::Shadows(args) => commands::shadows::execute(args, app).await?,

        // Toolchain, gated on built-in overrides
        Commands::Compile(args) => commands::toolchain::execute(Tool::Compile, args, app).await?,
        Commands::Check(args) => commands::toolchain::execute(Tool::Check, args, app).await?,
        Commands::Run(args) => commands::toolchain::execute(Tool::Run, args, app).await?,

        // Editor integration; exit without shutdown ends with status 1
        Commands::Serve(args) => {
            return match commands::serve::execute(args, app).await? {
                ExitReason::Clean => Ok(0),
                ExitReason::Abrupt => Ok(1),
            };
        }

        Commands::Config(args) => commands::config::execute(args, app).await?,
        Commands::Doctor(args) => commands::doctor::execute(args, app).await?,
    }
    Ok(0)
}
