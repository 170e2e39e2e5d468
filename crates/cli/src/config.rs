use anyhow::{Context, Result};
use processor::ProcessorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ITEMHUB_DIR: &str = ".itemhub";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:.itemhub/items.db";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ItemhubConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub processor: ProcessorSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

/// `[processor]` table. Absent keys fall back to [`ProcessorConfig::default`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProcessorSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_timeout_ms: Option<u64>,
}

impl ProcessorSettings {
    pub fn to_config(&self) -> ProcessorConfig {
        let config = ProcessorConfig::default()
            .with_batch_timeout(self.batch_timeout_ms.map(Duration::from_millis));
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }
}

impl ItemhubConfig {
    /// Reads the config file, or returns the defaults when it does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config: ItemhubConfig = toml::from_str(
            r#"
            [server]
            port = 8080
            database_url = "sqlite:items.db"

            [processor]
            workers = 8
            batch_timeout_ms = 30000
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.database_url, "sqlite:items.db");

        let processor = config.processor.to_config();
        assert_eq!(processor.workers, 8);
        assert_eq!(processor.batch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_processor_table_uses_defaults() {
        let config: ItemhubConfig = toml::from_str(
            r#"
            [server]
            port = 3001
            database_url = "sqlite:items.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.processor.to_config(), ProcessorConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);

        let missing = ItemhubConfig::load(&path).await.unwrap();
        assert_eq!(missing.server.port, DEFAULT_PORT);

        let mut config = ItemhubConfig::default();
        config.processor.workers = Some(2);
        config.save(&path).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!content.contains("batch_timeout_ms"));

        let loaded = ItemhubConfig::load(&path).await.unwrap();
        assert_eq!(loaded.processor.workers, Some(2));
        assert_eq!(loaded.server.database_url, DEFAULT_DATABASE_URL);
    }
}
