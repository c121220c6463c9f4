//! Command implementations for Lantern
//!
//! Each command is implemented in its own module.

pub mod config;
pub mod definition;
pub mod doctor;
pub mod hover;
pub mod lint;
pub mod outline;
pub mod serve;
pub mod shadows;
pub mod toolchain;
