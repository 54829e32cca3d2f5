use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BlockError;

/// Number of removals in flight at once unless configured otherwise.
pub const DEFAULT_RM_CONCURRENCY: usize = 8;

/// Configuration for the block service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Maximum number of identifiers a removal batch processes concurrently.
    pub rm_concurrency: usize,
    /// Give up acquiring the GC lock after this many seconds. `None` waits
    /// indefinitely.
    pub lock_timeout_secs: Option<u64>,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            rm_concurrency: DEFAULT_RM_CONCURRENCY,
            lock_timeout_secs: None,
        }
    }
}

impl BlockConfig {
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), BlockError> {
        if self.rm_concurrency == 0 {
            return Err(BlockError::Config(
                "rm_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BlockConfig::default();
        assert_eq!(config.rm_concurrency, 8);
        assert!(config.lock_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = BlockConfig {
            rm_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BlockError::Config(_))));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: BlockConfig = serde_json::from_str(r#"{"lock_timeout_secs": 5}"#).unwrap();
        assert_eq!(config.rm_concurrency, DEFAULT_RM_CONCURRENCY);
        assert_eq!(config.lock_timeout(), Some(Duration::from_secs(5)));
    }
}
