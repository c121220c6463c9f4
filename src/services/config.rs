//! Configuration service for Lantern

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::models::config::LanternConfig;

pub const PROJECT_DIR: &str = ".lantern";
const CONFIG_FILE: &str = "config.toml";

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<LanternConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
    /// Persist `safety.check_builtin_overrides = false` in the project config
    async fn suppress_override_check(&self) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/lantern/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lantern")
            .join(CONFIG_FILE)
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join(CONFIG_FILE)
    }

    async fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
        if !path.exists() {
            return Ok(toml::Table::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn write_table(path: &Path, table: &toml::Table) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content =
            toml::to_string_pretty(table).map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(&LanternConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<LanternConfig, ConfigError> {
        let mut table = Self::read_table(&Self::global_config_path()).await?;
        if !global_only {
            let project = Self::read_table(&self.project_config_path()).await?;
            merge_tables(&mut table, project);
        }

        let config: LanternConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

        if global_only {
            Ok(config)
        } else {
            apply_env_overrides(config)
        }
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            Self::global_config_path()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "config".to_string(),
                message: format!(
                    "Config already exists: {}. Use --force to overwrite.",
                    path.display()
                ),
            });
        }

        Self::write_default_config(&path).await?;
        Ok(path)
    }

    async fn suppress_override_check(&self) -> Result<PathBuf, ConfigError> {
        let path = self.project_config_path();
        let mut table = Self::read_table(&path).await?;

        let safety = table
            .entry("safety")
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        let Some(safety) = safety.as_table_mut() else {
            return Err(ConfigError::InvalidValue {
                key: "safety".to_string(),
                message: "expected a table".to_string(),
            });
        };
        safety.insert(
            "check_builtin_overrides".to_string(),
            toml::Value::Boolean(false),
        );

        Self::write_table(&path, &table).await?;
        tracing::info!("Disabled built-in override check in {}", path.display());
        Ok(path)
    }
}

/// Key-wise merge: overlay tables recurse, any other overlay value wins
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(base_inner)), toml::Value::Table(overlay_inner)) => {
                merge_tables(base_inner, overlay_inner);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides(config: LanternConfig) -> Result<LanternConfig, ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

fn apply_overrides(
    mut config: LanternConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<LanternConfig, ConfigError> {
    if let Some(val) = var("LANTERN_COMPILER") {
        config.toolchain.compiler = val;
    }
    if let Some(val) = var("LANTERN_RUNNER") {
        config.toolchain.runner = val;
    }
    if let Some(val) = var("LANTERN_TIMEOUT") {
        config.toolchain.timeout_secs = val.parse().map_err(|_| ConfigError::InvalidValue {
            key: "LANTERN_TIMEOUT".to_string(),
            message: format!("expected seconds, got '{}'", val),
        })?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_merge_tables_is_key_wise() {
        let mut base: toml::Table = toml::from_str(
            "[toolchain]\ncompiler = \"a\"\nrunner = \"r\"\n[safety]\ncheck_builtin_overrides = true\n",
        )
        .unwrap();
        let overlay: toml::Table = toml::from_str("[toolchain]\ncompiler = \"b\"\n").unwrap();
        merge_tables(&mut base, overlay);

        let config: LanternConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.toolchain.compiler, "b");
        assert_eq!(config.toolchain.runner, "r");
        assert!(config.safety.check_builtin_overrides);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("LANTERN_COMPILER", "/opt/lc"), ("LANTERN_TIMEOUT", "5")]);
        let config = apply_overrides(LanternConfig::default(), |k| {
            vars.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.toolchain.compiler, "/opt/lc");
        assert_eq!(config.toolchain.runner, "lantern-run");
        assert_eq!(config.toolchain.timeout_secs, 5);

        let err = apply_overrides(LanternConfig::default(), |k| {
            (k == "LANTERN_TIMEOUT").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let service = DefaultConfigService::new(temp.path());

        let path = service.init(false, false).await.unwrap();
        assert!(path.ends_with(".lantern/config.toml"));
        assert!(service.init(false, false).await.is_err());
        assert!(service.init(false, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_suppress_override_check_preserves_other_keys() {
        let temp = TempDir::new().unwrap();
        let service = DefaultConfigService::new(temp.path());
        let path = service.config_path(false);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "[toolchain]\ncompiler = \"mycc\"\n")
            .await
            .unwrap();

        service.suppress_override_check().await.unwrap();

        let table = DefaultConfigService::read_table(&path).await.unwrap();
        let config: LanternConfig = toml::Value::Table(table).try_into().unwrap();
        assert!(!config.safety.check_builtin_overrides);
        assert_eq!(config.toolchain.compiler, "mycc");
    }

    #[tokio::test]
    async fn test_invalid_project_config() {
        let temp = TempDir::new().unwrap();
        let service = DefaultConfigService::new(temp.path());
        let path = service.config_path(false);
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "[safety\n").await.unwrap();

        let err = DefaultConfigService::read_table(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
