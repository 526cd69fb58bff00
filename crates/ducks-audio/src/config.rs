use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AudioError;
use crate::sprite::Spritemap;

/// Engine-wide settings. Maps to the `[audio]` table of the game's settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between the end of one scheduler tick and the start of the next, in milliseconds.
    pub tick_interval_ms: u64,
    /// Skip the native backend and use the fallback path only.
    pub enforce_fallback_backend: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            enforce_fallback_backend: false,
        }
    }
}

impl EngineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// What a unit does right after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Autoplay {
    /// `true` starts the stream from the beginning, `false` does nothing.
    Stream(bool),
    /// Start the named sprite (on single-channel platforms: as background music).
    Sprite(String),
}

impl Autoplay {
    pub const OFF: Autoplay = Autoplay::Stream(false);

    pub fn is_off(&self) -> bool {
        matches!(self, Autoplay::Stream(false))
    }
}

impl Default for Autoplay {
    fn default() -> Self {
        Self::OFF
    }
}

/// Construction settings of one playback unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    /// Candidate files, one per codec/container, in order of preference.
    pub resources: Vec<String>,
    pub autoplay: Autoplay,
    pub spritemap: Spritemap,
    /// Loop the whole stream. Only meaningful without a spritemap.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Request the fallback backend. The capability probe runs once per engine,
    /// so this only takes effect through [`EngineConfig::enforce_fallback_backend`].
    pub enforce_fallback_backend: bool,
}

impl UnitSettings {
    /// Settings for the given candidate resources, everything else default.
    pub fn new<S: Into<String>>(resources: impl IntoIterator<Item = S>) -> Self {
        Self {
            resources: resources.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_spritemap(mut self, spritemap: Spritemap) -> Self {
        self.spritemap = spritemap;
        self
    }

    pub fn with_autoplay(mut self, autoplay: Autoplay) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn validate(&self) -> Result<(), AudioError> {
        if self.resources.is_empty() {
            return Err(AudioError::InvalidSettings(
                "at least one resource is required".into(),
            ));
        }
        Ok(())
    }

    /// Copy used for pooled duplicates: same sources and sprites, never autoplaying.
    pub fn for_clone(&self) -> Self {
        Self {
            autoplay: Autoplay::OFF,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert!(!config.enforce_fallback_backend);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = EngineConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_unit_settings_from_toml() {
        let settings: UnitSettings = toml::from_str(
            r#"
            resources = ["media/ducks.ogg", "media/ducks.mp3"]
            autoplay = "music"

            [spritemap.music]
            start = 0.0
            end = 63.94
            loop = true

            [spritemap.pickup]
            start = 65.0
            end = 66.47
            "#,
        )
        .unwrap();
        assert_eq!(settings.resources.len(), 2);
        assert_eq!(settings.autoplay, Autoplay::Sprite("music".into()));
        assert_eq!(settings.spritemap.len(), 2);
        assert!(!settings.looping);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_autoplay_bool() {
        let settings: UnitSettings = toml::from_str(
            r#"
            resources = ["theme.mp3"]
            autoplay = true
            loop = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.autoplay, Autoplay::Stream(true));
        assert!(settings.looping);
        assert!(settings.spritemap.is_empty());
    }

    #[test]
    fn test_clone_settings_never_autoplay() {
        let settings = UnitSettings::new(["a.mp3"]).with_autoplay(Autoplay::Sprite("x".into()));
        assert!(settings.for_clone().autoplay.is_off());
        assert_eq!(settings.for_clone().resources, settings.resources);
    }

    #[test]
    fn test_empty_resources_rejected() {
        let settings = UnitSettings::default();
        assert!(matches!(
            settings.validate(),
            Err(AudioError::InvalidSettings(_))
        ));
    }
}
