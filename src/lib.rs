//! Lantern - source analysis library for the Lantern language
//!
//! Pattern-based declaration scanning, built-in shadowing detection and
//! terminator lint, with the toolchain gate and language server built on
//! top of them.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod error;
pub mod infra;
pub mod models;
pub mod server;
pub mod services;

pub use error::{LanternError, LanternResult};
