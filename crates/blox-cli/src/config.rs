use std::path::Path;

use anyhow::Context;
use blox_block::BlockConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "config.toml";

/// Node configuration stored in `<repo>/config.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub block: BlockConfig,
}

impl NodeConfig {
    /// Read the repository config, falling back to defaults when absent.
    pub fn load(repo: &Path) -> anyhow::Result<Self> {
        let path = repo.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config.block.validate()?;
        Ok(config)
    }

    pub fn save(&self, repo: &Path) -> anyhow::Result<()> {
        let path = repo.join(CONFIG_FILE);
        let text = toml::to_string_pretty(self)?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig::load(dir.path()).unwrap();
        assert_eq!(config.block.rm_concurrency, 8);
        assert_eq!(config.block.lock_timeout_secs, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[block]\nlock_timeout_secs = 3\n").unwrap();
        let config = NodeConfig::load(dir.path()).unwrap();
        assert_eq!(config.block.rm_concurrency, 8);
        assert_eq!(config.block.lock_timeout_secs, Some(3));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[block]\nrm_concurrency = 0\n").unwrap();
        assert!(NodeConfig::load(dir.path()).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.block.rm_concurrency = 3;
        config.save(dir.path()).unwrap();
        assert_eq!(NodeConfig::load(dir.path()).unwrap(), config);
    }
}
