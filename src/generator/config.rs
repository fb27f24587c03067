use serde::{Deserialize, Serialize};

use crate::container::ContainerFormat;

/// Record key holding each record's timestamp
pub const DEFAULT_TIME_KEY: &str = "Datetime";

/// Deflate level used when none is configured (the netCDF-4 zlib default)
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 4;

/// Highest supported Deflate level
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Configuration for the container generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Output container backend
    pub format: ContainerFormat,

    /// Deflate level for numeric variables (0 disables compression)
    pub compression_level: u32,

    /// Record key used to derive the observation start/end times
    pub time_key: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            format: ContainerFormat::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            time_key: DEFAULT_TIME_KEY.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Fast writing, larger files
    pub fn fast() -> Self {
        Self {
            compression_level: 1,
            ..Default::default()
        }
    }

    /// Smallest files, slower writing
    pub fn max_compression() -> Self {
        Self {
            compression_level: MAX_COMPRESSION_LEVEL,
            ..Default::default()
        }
    }

    /// Set the container backend
    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the time key
    pub fn with_time_key(mut self, time_key: impl Into<String>) -> Self {
        self.time_key = time_key.into();
        self
    }

    /// Effective Deflate level for numeric variables; `None` means stored.
    pub fn compression(&self) -> Option<u32> {
        match self.compression_level {
            0 => None,
            level => Some(level.min(MAX_COMPRESSION_LEVEL)),
        }
    }
}
