use ethlotto_core::{LottoConfig, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub rpc_url: Option<String>,
    pub assume_yes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ethlotto"),
            rpc_url: None,
            assume_yes: false,
        }
    }
}

impl CliConfig {
    pub fn resolve(data_dir: Option<PathBuf>, rpc_url: Option<String>, assume_yes: bool) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: data_dir.unwrap_or(defaults.data_dir),
            rpc_url,
            assume_yes,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// The saved config with command-line overrides applied.
    pub async fn load_lotto_config(&self) -> Result<LottoConfig> {
        let mut config = LottoConfig::load(&self.config_path()).await?;
        if let Some(url) = &self.rpc_url {
            config.provider_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rpc_url_override() {
        let dir = tempdir().unwrap();
        let config = CliConfig::resolve(
            Some(dir.path().to_path_buf()),
            Some("http://127.0.0.1:8545".to_string()),
            false,
        );

        let lotto = config.load_lotto_config().await.unwrap();
        assert_eq!(lotto.provider_url, "http://127.0.0.1:8545");
        assert_eq!(config.config_path(), dir.path().join("config.json"));
    }

    #[tokio::test]
    async fn test_invalid_override_is_rejected() {
        let dir = tempdir().unwrap();
        let config =
            CliConfig::resolve(Some(dir.path().to_path_buf()), Some("localhost".into()), true);
        assert!(config.load_lotto_config().await.is_err());
    }
}
