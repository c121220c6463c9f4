//! Configuration model for Lantern
//!
//! Loaded from `~/.config/lantern/config.toml` and `.lantern/config.toml`.

use serde::{Deserialize, Serialize};

/// Lantern configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LanternConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub safety: SafetyConfig,

    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// File extensions treated as source files
    #[serde(default = "defaults::extensions")]
    pub extensions: Vec<String>,

    /// Names added to the built-in reserved set
    #[serde(default)]
    pub extra_reserved_names: Vec<String>,

    /// Emit missing-terminator warnings
    #[serde(default = "defaults::lint")]
    pub lint: bool,

    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: defaults::extensions(),
            extra_reserved_names: Vec::new(),
            lint: defaults::lint(),
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

impl AnalysisConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        if self.max_file_size_mb == 0 {
            u64::MAX
        } else {
            u64::from(self.max_file_size_mb) * 1024 * 1024
        }
    }

    pub fn is_source_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Pre-run safety checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Warn before compile/check/run when built-in names are shadowed
    #[serde(default = "defaults::check_builtin_overrides")]
    pub check_builtin_overrides: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            check_builtin_overrides: defaults::check_builtin_overrides(),
        }
    }
}

/// External compiler, checker and runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "defaults::compiler")]
    pub compiler: String,

    #[serde(default = "defaults::output_flag")]
    pub output_flag: String,

    /// Syntax checker binary; falls back to the compiler
    #[serde(default)]
    pub checker: Option<String>,

    #[serde(default = "defaults::check_flag")]
    pub check_flag: String,

    #[serde(default = "defaults::runner")]
    pub runner: String,

    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: defaults::compiler(),
            output_flag: defaults::output_flag(),
            checker: None,
            check_flag: defaults::check_flag(),
            runner: defaults::runner(),
            timeout_secs: defaults::timeout_secs(),
        }
    }
}

impl ToolchainConfig {
    pub fn checker(&self) -> &str {
        self.checker.as_deref().unwrap_or(&self.compiler)
    }
}

/// Language server behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Answer to the override gate when a gated command runs inside the
    /// server: "abort", "proceed" or "remember"
    #[serde(default = "defaults::override_policy")]
    pub override_policy: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            override_policy: defaults::override_policy(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}

mod defaults {
    // Analysis
    pub fn extensions() -> Vec<String> {
        vec!["ln".to_string()]
    }
    pub fn lint() -> bool {
        true
    }
    pub fn max_file_size_mb() -> u32 {
        5
    }

    // Safety
    pub fn check_builtin_overrides() -> bool {
        true
    }

    // Toolchain
    pub fn compiler() -> String {
        "lanternc".to_string()
    }
    pub fn output_flag() -> String {
        "-o".to_string()
    }
    pub fn check_flag() -> String {
        "--check".to_string()
    }
    pub fn runner() -> String {
        "lantern-run".to_string()
    }
    pub fn timeout_secs() -> u64 {
        60
    }

    // Server
    pub fn override_policy() -> String {
        "abort".to_string()
    }

    // Output
    pub fn format() -> String {
        "json".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LanternConfig::default();
        assert_eq!(config.analysis.extensions, vec!["ln".to_string()]);
        assert!(config.analysis.lint);
        assert!(config.safety.check_builtin_overrides);
        assert_eq!(config.toolchain.compiler, "lanternc");
        assert_eq!(config.toolchain.checker(), "lanternc");
        assert_eq!(config.toolchain.timeout_secs, 60);
        assert_eq!(config.server.override_policy, "abort");
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LanternConfig = toml::from_str(
            r#"
            [safety]
            check_builtin_overrides = false

            [toolchain]
            checker = "lantern-check"
            "#,
        )
        .unwrap();

        assert!(!config.safety.check_builtin_overrides);
        assert_eq!(config.toolchain.checker(), "lantern-check");
        assert_eq!(config.toolchain.output_flag, "-o");
        assert_eq!(config.analysis.max_file_size_mb, 5);
    }

    #[test]
    fn test_max_file_size_unlimited() {
        let analysis = AnalysisConfig {
            max_file_size_mb: 0,
            ..Default::default()
        };
        assert_eq!(analysis.max_file_size_bytes(), u64::MAX);
        assert!(analysis.is_source_extension("LN"));
        assert!(!analysis.is_source_extension("py"));
    }
}
