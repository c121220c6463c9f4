//! CLI module for Lantern
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod location;
pub mod output;
pub mod response;

pub use location::ParsedLocation;
pub use output::OutputContext;

use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, definition::DefinitionArgs, doctor::DoctorArgs, hover::HoverArgs,
    lint::LintArgs, outline::OutlineArgs, serve::ServeArgs, shadows::ShadowsArgs,
    toolchain::ToolArgs,
};

const LONG_ABOUT: &str = r#"
Lantern - source analysis and editor support for the Lantern language

Lantern scans .ln files for class, interface and function declarations,
flags statements missing their terminating ';' and warns when a file
redefines a built-in name before it is compiled or run.

QUICK START:
  1. Create a project config:   lantern config init
  2. Outline a file:            lantern outline src/main.ln
  3. Lint a directory:          lantern lint src/
  4. Compile with a safety net: lantern compile src/main.ln

NAVIGATION EXAMPLES:
  lantern definition src/main.ln:12:9
  lantern hover src/main.ln:3:5
  lantern shadows src/main.ln

EDITOR INTEGRATION:
  lantern serve                  # language server on stdio
"#;

/// Lantern - source analysis and editor support for the Lantern language
#[derive(Parser, Debug)]
#[command(name = "lantern")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'lantern <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, text); defaults to output.format from config
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Verbose output (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List classes, interfaces and functions declared in a file
    Outline(OutlineArgs),

    /// Find the declaration of the name at a position
    Definition(DefinitionArgs),

    /// Describe the symbol or built-in at a position
    Hover(HoverArgs),

    /// Report statements missing a terminating ';'
    Lint(LintArgs),

    /// List redefinitions of built-in names
    Shadows(ShadowsArgs),

    /// Compile a file with the configured compiler
    Compile(ToolArgs),

    /// Syntax-check a file with the configured checker
    Check(ToolArgs),

    /// Run a file with the configured runner
    Run(ToolArgs),

    /// Start the language server on stdio
    Serve(ServeArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Check the toolchain and language server
    Doctor(DoctorArgs),
}
