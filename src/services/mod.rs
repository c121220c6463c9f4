//! Service layer for Lantern
//!
//! Collaborators around the analyzer: configuration, the external
//! toolchain and the override gate.

pub mod config;
pub mod gate;
pub mod toolchain;

pub use config::{ConfigService, DefaultConfigService};
pub use gate::{
    FixedPrompt, GateDecision, OverridePolicy, OverridePrompt, PromptChoice, TerminalPrompt,
    evaluate,
};
pub use toolchain::{DefaultToolchainService, ToolOutput, ToolchainService};
