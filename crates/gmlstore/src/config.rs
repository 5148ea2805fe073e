use gmlstore_core::Result;

use serde::Deserialize;

/// Runtime options of a [`FeatureStore`](crate::FeatureStore).
///
/// ```toml
/// url = "postgresql://gis@localhost/features"
/// id_filter_threshold = 64
///
/// [pool]
/// max_size = 8
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Connection URL. Only needed by [`Builder::connect`](crate::Builder::connect).
    pub url: Option<String>,

    pub pool: PoolConfig,

    /// Id filters listing more ids than this are evaluated through a
    /// temporary table instead of an `IN` list.
    pub id_filter_threshold: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    pub max_size: usize,
}

impl StoreConfig {
    pub const DEFAULT_ID_FILTER_THRESHOLD: usize = 64;

    pub fn new() -> StoreConfig {
        StoreConfig {
            url: None,
            pool: PoolConfig::default(),
            id_filter_threshold: Self::DEFAULT_ID_FILTER_THRESHOLD,
        }
    }

    pub fn from_toml(src: &str) -> Result<StoreConfig> {
        Ok(toml::from_str(src)?)
    }

    pub fn url(mut self, url: impl Into<String>) -> StoreConfig {
        self.url = Some(url.into());
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolConfig {
    /// Creates a new pool configuration with default settings: twice the
    /// number of CPU cores.
    pub fn new() -> Self {
        Self {
            max_size: deadpool::managed::PoolConfig::default().max_size,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let config = StoreConfig::from_toml("url = \"postgresql://localhost/features\"").unwrap();
        assert_eq!(config.url.as_deref(), Some("postgresql://localhost/features"));
        assert_eq!(config.id_filter_threshold, 64);
        assert!(config.pool.max_size > 0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = StoreConfig::from_toml("pool_size = 4").unwrap_err();
        assert!(err.is_invalid_mapping_config());
    }
}
