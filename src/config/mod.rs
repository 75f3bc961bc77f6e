// Configuration management for talebox
// Handles loading/saving settings, with sensible defaults when config is missing

use anyhow::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the audiobook directory tree.
    pub library_root: PathBuf,
    /// Where the library index and listening state live.
    pub data_dir: PathBuf,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Status/checkpoint polling cadence while a chapter plays.
    pub poll_interval_ms: u64,
    /// 0.0 to 1.0
    pub volume: f32,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("talebox");

        Self {
            library_root: dirs::audio_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Audiobooks"),
            data_dir,
            playback: PlaybackConfig {
                poll_interval_ms: 100,
                volume: 0.8,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("talebox");

        Ok(config_dir.join("config.toml"))
    }

    pub fn library_doc_path(&self) -> PathBuf {
        self.data_dir.join("library.json")
    }

    pub fn current_book_path(&self) -> PathBuf {
        self.data_dir.join("current_book.json")
    }

    pub fn current_position_path(&self) -> PathBuf {
        self.data_dir.join("current_position.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}
