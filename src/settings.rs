//! Audio settings with persistence
//!
//! Settings are saved to `~/.config/ducks/audio.toml`

use std::fs;
use std::path::PathBuf;

use ducks_audio::{Autoplay, EngineConfig, Spritemap, UnitSettings};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Everything the driver needs to start the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: EngineConfig,
    /// The unit holding every sprite of the game
    pub soundtrack: UnitSettings,
    /// Sprites requested one after another once the soundtrack is up
    pub effects: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let spritemap = Spritemap::new()
            .with("music", 0.0, 63.94, true)
            .and_then(|m| m.with("pickup", 65.0, 66.47, false))
            .and_then(|m| m.with("quack", 68.0, 68.6, false))
            .unwrap_or_default();

        Self {
            audio: EngineConfig::default(),
            soundtrack: UnitSettings::new(["media/ducks.ogg", "media/ducks.mp3"])
                .with_spritemap(spritemap)
                .with_autoplay(Autoplay::Sprite("music".to_string())),
            effects: vec!["pickup".to_string(), "quack".to_string(), "quack".to_string()],
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ducks"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("audio.toml"))
    }

    /// Whether a settings file is present on disk
    pub fn exists() -> bool {
        Self::settings_path().is_some_and(|p| p.exists())
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("audio.toml");

        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Engine config with the soundtrack's fallback request folded in. The
    /// backend is chosen once per engine, so a unit cannot pick its own.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            enforce_fallback_backend: self.audio.enforce_fallback_backend
                || self.soundtrack.enforce_fallback_backend,
            ..self.audio.clone()
        }
    }
}
