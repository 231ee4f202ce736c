//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransferError};

/// Tunable knobs for the transfer engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Longest accepted statement description
    pub max_description_length: usize,

    /// Page size used when a search omits one
    pub default_page_size: u32,

    /// Largest page size a search may request
    pub max_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_description_length: 140,
            default_page_size: 50,
            max_page_size: 200,
        }
    }
}

impl EngineConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransferError::Config(format!("Failed to read config: {}", e)))?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| TransferError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Ok(value) = std::env::var("BANK_MAX_DESCRIPTION_LENGTH") {
            config.max_description_length = value
                .parse()
                .map_err(|e| TransferError::Config(format!("BANK_MAX_DESCRIPTION_LENGTH: {}", e)))?;
        }
        if let Ok(value) = std::env::var("BANK_DEFAULT_PAGE_SIZE") {
            config.default_page_size = value
                .parse()
                .map_err(|e| TransferError::Config(format!("BANK_DEFAULT_PAGE_SIZE: {}", e)))?;
        }
        if let Ok(value) = std::env::var("BANK_MAX_PAGE_SIZE") {
            config.max_page_size = value
                .parse()
                .map_err(|e| TransferError::Config(format!("BANK_MAX_PAGE_SIZE: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(TransferError::Config(
                "page sizes must be positive".to_owned(),
            ));
        }
        if self.default_page_size > self.max_page_size {
            return Err(TransferError::Config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }
        Ok(())
    }
}
