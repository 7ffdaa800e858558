use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::currency::DEFAULT_RATE;
use crate::error::{Result, TripbookError};
use crate::photo::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use crate::storage::validate_key;

pub const CONFIG_FILE: &str = "config.json";

/// Roughly what a browser grants a page for local storage.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Settings read from `.tripbook/config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Storage key for the notes document. Bump the version suffix when the
    /// record shape changes.
    pub notes_key: String,
    /// Storage key for the expenses document.
    pub expenses_key: String,
    /// Byte budget shared by all stored documents.
    pub quota_bytes: u64,
    /// JPY -> TWD rate used when none is given on the command line.
    pub default_rate: f64,
    pub image: ImageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub max_width: u32,
    pub quality: f32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            notes_key: "kyushu_trip_notes_v1".to_string(),
            expenses_key: "kyushu_trip_expenses_v1".to_string(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            default_rate: DEFAULT_RATE,
            image: ImageConfig::default(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl JournalConfig {
    /// Read `config.json` from `dir`, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is an error.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| TripbookError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(CONFIG_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.notes_key).map_err(|e| TripbookError::Config(e.to_string()))?;
        validate_key(&self.expenses_key).map_err(|e| TripbookError::Config(e.to_string()))?;
        if self.notes_key == self.expenses_key {
            return Err(TripbookError::Config(
                "notes_key and expenses_key must differ".to_string(),
            ));
        }
        if !self.default_rate.is_finite() || self.default_rate < 0.0 {
            return Err(TripbookError::Config(format!(
                "default_rate must be a finite number >= 0, got {}",
                self.default_rate
            )));
        }
        if self.image.max_width == 0 {
            return Err(TripbookError::Config(
                "image.max_width must be positive".to_string(),
            ));
        }
        if !(self.image.quality > 0.0 && self.image.quality <= 1.0) {
            return Err(TripbookError::Config(format!(
                "image.quality must be in (0, 1], got {}",
                self.image.quality
            )));
        }
        Ok(())
    }
}
