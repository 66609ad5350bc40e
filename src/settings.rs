//! User settings read from `<config_dir>/siftdupe/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use siftdupe_analyze::DetectionConfig;
use siftdupe_core::{ScanConfig, ScanConfigBuilder};

/// Scan options that make sense to persist; the root always comes from the
/// command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub max_depth: Option<u32>,
    pub ignore_patterns: Vec<String>,
    pub min_size: u64,
    /// Scanner threads (0 = auto-detect).
    pub threads: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            include_hidden: false,
            follow_symlinks: false,
            max_depth: None,
            ignore_patterns: vec![".git".to_string(), "node_modules".to_string()],
            min_size: 1,
            threads: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanSettings,
    pub detection: DetectionConfig,
}

impl Settings {
    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("siftdupe").join("config.toml"))
    }

    /// Load settings from the config file, or return defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`. A missing file gives the defaults; a
    /// malformed or out-of-range one is reported and ignored.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str::<Settings>(&content) {
            Ok(settings) => match settings.detection.validate() {
                Ok(()) => settings,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring invalid settings");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring malformed settings");
                Self::default()
            }
        }
    }

    /// Scan config builder for `root` seeded from these settings.
    pub fn scan_builder(&self, root: &Path) -> ScanConfigBuilder {
        let mut builder = ScanConfig::builder();
        builder
            .root(root)
            .include_hidden(self.scan.include_hidden)
            .follow_symlinks(self.scan.follow_symlinks)
            .max_depth(self.scan.max_depth)
            .ignore_patterns(self.scan.ignore_patterns.clone())
            .min_size(self.scan.min_size)
            .threads(self.scan.threads);
        builder
    }
}
