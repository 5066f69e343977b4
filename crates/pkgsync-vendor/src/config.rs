use crate::VendorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ARCHIVE_BASE_URL: &str = "https://github.com";
pub const DEFAULT_VENDOR_DIR: &str = "vendor/assets/elm";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    #[serde(default = "default_archive_base_url")]
    pub archive_base_url: String,
    #[serde(default = "default_vendor_dir")]
    pub vendor_dir: PathBuf,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            archive_base_url: default_archive_base_url(),
            vendor_dir: default_vendor_dir(),
        }
    }
}

fn default_archive_base_url() -> String {
    DEFAULT_ARCHIVE_BASE_URL.to_owned()
}

fn default_vendor_dir() -> PathBuf {
    PathBuf::from(DEFAULT_VENDOR_DIR)
}

impl VendorConfig {
    #[must_use]
    pub fn with_archive_base_url(mut self, url: &str) -> Self {
        self.archive_base_url = url.trim_end_matches('/').to_owned();
        self
    }

    #[must_use]
    pub fn with_vendor_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.vendor_dir = dir.into();
        self
    }

    /// Load `~/.config/pkgsync/vendor.json` if it exists, defaults otherwise.
    pub fn load_default() -> Result<Self, VendorError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, VendorError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| VendorError::Config(format!("invalid vendor config: {e}")))?;
        let trimmed = config.archive_base_url.trim_end_matches('/').len();
        config.archive_base_url.truncate(trimmed);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), VendorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| VendorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/pkgsync/vendor.json"))
}
