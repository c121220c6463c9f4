//! Application container for Lantern

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::analysis::{Analyzer, SourceText};
use crate::cli::OutputContext;
use crate::cli::output::OutputFormat;
use crate::models::config::LanternConfig;
use crate::services::config::{ConfigService, DefaultConfigService};
use crate::services::toolchain::{DefaultToolchainService, ToolchainService};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) analyzer: Analyzer,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) toolchain: Arc<dyn ToolchainService>,
    pub(crate) config: LanternConfig,
}

impl App {
    /// `format` overrides `output.format` from the config files
    pub async fn new(format: Option<&str>) -> Result<Self> {
        let root = std::env::current_dir()?;
        tracing::debug!("Initializing Lantern at {:?}", root);

        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                LanternConfig::default()
            }
        };

        let format = format
            .unwrap_or(&config.output.format)
            .parse::<OutputFormat>()
            .map_err(anyhow::Error::msg)?;

        Ok(Self::with_parts(root, format, config, config_service))
    }

    pub fn with_parts(
        root: PathBuf,
        format: OutputFormat,
        config: LanternConfig,
        config_service: Arc<dyn ConfigService>,
    ) -> Self {
        let output = OutputContext::new(root.clone(), format);
        let analyzer = Analyzer::from_config(&config.analysis);
        let toolchain = Arc::new(DefaultToolchainService::new(config.toolchain.clone()));

        Self {
            root,
            output,
            analyzer,
            config_service,
            toolchain,
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &LanternConfig {
        &self.config
    }

    /// Resolve `path` against the working directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read a source file, enforcing `analysis.max_file_size_mb`
    pub async fn read_source(&self, path: &Path) -> Result<SourceText> {
        let path = self.resolve(path);
        let meta = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("File not found: {}", path.display()))?;
        if !meta.is_file() {
            bail!("Not a file: {}", path.display());
        }

        let limit = self.config.analysis.max_file_size_bytes();
        if meta.len() > limit {
            bail!(
                "{} is {} bytes, over the {} MB limit",
                path.display(),
                meta.len(),
                self.config.analysis.max_file_size_mb
            );
        }

        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(SourceText::from_bytes(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app_in(dir: &TempDir, config: LanternConfig) -> App {
        let root = dir.path().to_path_buf();
        let service = Arc::new(DefaultConfigService::new(&root));
        App::with_parts(root, OutputFormat::Json, config, service)
    }

    #[tokio::test]
    async fn test_read_source_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ln"), "class A {}\n").unwrap();
        let app = app_in(&dir, LanternConfig::default());

        let source = app.read_source(Path::new("a.ln")).await.unwrap();
        assert_eq!(source.as_str(), "class A {}\n");
        assert!(app.read_source(Path::new("missing.ln")).await.is_err());
    }

    #[tokio::test]
    async fn test_read_source_size_limit() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.ln"), "x;\n".repeat(400_000)).unwrap();

        let mut config = LanternConfig::default();
        config.analysis.max_file_size_mb = 1;
        let app = app_in(&dir, config);
        let err = app.read_source(Path::new("big.ln")).await.unwrap_err();
        assert!(err.to_string().contains("limit"));

        let mut config = LanternConfig::default();
        config.analysis.max_file_size_mb = 0;
        let app = app_in(&dir, config);
        assert!(app.read_source(Path::new("big.ln")).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_source_latin1_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("latin.ln"),
            b"name = 'caf\xE9';\ndef print(x) {\n}\n",
        )
        .unwrap();
        let app = app_in(&dir, LanternConfig::default());

        let source = app.read_source(Path::new("latin.ln")).await.unwrap();
        let overrides = app.analyzer.overrides(&source);
        let names: Vec<&str> = overrides.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["print"]);
        assert_eq!(overrides[0].line_number, 2);
    }
}
