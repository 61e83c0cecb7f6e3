//! Common types shared across OpenAlg crates

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Supported light-gun titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameId {
    MadDog,
}

impl GameId {
    /// Get the display name for this game
    pub fn display_name(&self) -> &str {
        match self {
            GameId::MadDog => "Mad Dog McCree",
        }
    }

    /// Short lowercase id, used for save slot file names
    pub fn short_name(&self) -> &str {
        match self {
            GameId::MadDog => "maddog",
        }
    }

    /// Archive holding the scene videos
    pub fn lib_file(&self) -> &str {
        match self {
            GameId::MadDog => "MADDOG.LIB",
        }
    }

    /// Scene script describing the video timeline
    pub fn script_file(&self) -> &str {
        match self {
            GameId::MadDog => "MADDOG.SCN",
        }
    }

    /// Get all supported games
    pub fn all() -> Vec<GameId> {
        vec![GameId::MadDog]
    }
}

/// Configuration for a game instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub game_id: GameId,
    /// Directory holding the LIB archive, scene script and sound cues
    pub data_path: Option<PathBuf>,
    /// Window scale factor (320x200 native)
    pub scale: u32,
    /// Overrides the game's frame skip when set
    pub frame_skip: Option<u32>,
    /// Fixed seed for scene randomisation
    pub seed: Option<u64>,
    pub draw_rects: bool,
    pub god_mode: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            game_id: GameId::MadDog,
            data_path: None,
            scale: 3,
            frame_skip: None,
            seed: None,
            draw_rects: false,
            god_mode: false,
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub save_path: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            save_path: std::env::current_dir().unwrap_or_default().join("saves"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
