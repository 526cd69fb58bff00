//! Sprites: named sub-clips of one continuous audio resource.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Name of the implicit sprite covering a whole stream when no spritemap is given.
pub const STREAM_SPRITE: &str = "stream";

/// A named region `[start, end]` (seconds) within a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteEntry {
    /// Filled in from the spritemap key.
    #[serde(skip)]
    pub name: String,
    pub start: f64,
    pub end: f64,
    /// Restart at `start` when playback passes `end`.
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

impl SpriteEntry {
    pub fn new(name: impl Into<String>, start: f64, end: f64, looping: bool) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            looping,
        }
    }

    /// Length of the region in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `time` falls inside `[start, end]`.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// What to play: a sprite by name, or a timestamp inside some sprite.
#[derive(Debug, Clone, PartialEq)]
pub enum Pointer {
    Sprite(String),
    Time(f64),
}

impl From<&str> for Pointer {
    fn from(name: &str) -> Self {
        Pointer::Sprite(name.to_string())
    }
}

impl From<String> for Pointer {
    fn from(name: String) -> Self {
        Pointer::Sprite(name)
    }
}

impl From<f64> for Pointer {
    fn from(time: f64) -> Self {
        Pointer::Time(time)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::Sprite(name) => write!(f, "'{name}'"),
            Pointer::Time(time) => write!(f, "{time:.3}s"),
        }
    }
}

/// Ordered mapping of sprite name to entry. Keys are unique; iteration follows
/// insertion order, which is also the order timestamps are matched in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, SpriteEntry>",
    into = "IndexMap<String, SpriteEntry>"
)]
pub struct Spritemap {
    entries: IndexMap<String, SpriteEntry>,
}

impl Spritemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single sprite spanning the whole stream, used when a unit has no spritemap.
    pub fn whole_stream(looping: bool) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(
            STREAM_SPRITE.to_string(),
            SpriteEntry::new(STREAM_SPRITE, 0.0, f64::INFINITY, looping),
        );
        Self { entries }
    }

    /// Add an entry. Names must be unique and regions must not be inverted.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        start: f64,
        end: f64,
        looping: bool,
    ) -> Result<(), AudioError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(AudioError::InvalidSettings(format!(
                "duplicate sprite '{name}'"
            )));
        }
        if !(start >= 0.0 && end >= start) {
            return Err(AudioError::InvalidSettings(format!(
                "sprite '{name}' has an invalid range [{start}, {end}]"
            )));
        }
        let entry = SpriteEntry::new(name.clone(), start, end, looping);
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(
        mut self,
        name: impl Into<String>,
        start: f64,
        end: f64,
        looping: bool,
    ) -> Result<Self, AudioError> {
        self.insert(name, start, end, looping)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&SpriteEntry> {
        self.entries.get(name)
    }

    /// First entry (in insertion order) whose range contains `time`.
    pub fn find_at(&self, time: f64) -> Option<&SpriteEntry> {
        self.entries.values().find(|entry| entry.contains(time))
    }

    /// Resolve a pointer to the targeted entry and the position to seek to.
    ///
    /// A name seeks to the sprite's start; a timestamp seeks to itself. Returns
    /// `None` for unknown names and timestamps outside every sprite.
    pub fn resolve(&self, pointer: &Pointer) -> Option<(&SpriteEntry, f64)> {
        match pointer {
            Pointer::Sprite(name) => self.get(name).map(|entry| (entry, entry.start)),
            Pointer::Time(time) => self.find_at(*time).map(|entry| (entry, *time)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpriteEntry> {
        self.entries.values()
    }
}

impl TryFrom<IndexMap<String, SpriteEntry>> for Spritemap {
    type Error = AudioError;

    fn try_from(raw: IndexMap<String, SpriteEntry>) -> Result<Self, Self::Error> {
        let mut map = Spritemap::new();
        for (name, entry) in raw {
            map.insert(name, entry.start, entry.end, entry.looping)?;
        }
        Ok(map)
    }
}

impl From<Spritemap> for IndexMap<String, SpriteEntry> {
    fn from(map: Spritemap) -> Self {
        map.entries
    }
}
