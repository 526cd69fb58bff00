//! In-memory host. Voices make no sound; their position advances with the engine
//! clock, and every voice keeps a record of what was done to it.
//!
//! Used for headless runs and for deterministic scheduler tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ducks_core::Clock;
use tracing::trace;

use super::{AudioHost, Voice};
use crate::error::SeekError;

/// Shape of the simulated environment.
#[derive(Debug, Clone)]
pub struct VirtualHostConfig {
    /// Platform identification string reported to the capability probe
    pub platform: String,
    /// Native playback path present
    pub native: bool,
    /// Fallback playback path present
    pub fallback: bool,
    /// MIME types the native path claims to decode
    pub playable_types: Vec<String>,
    /// Native voices honor volume changes
    pub volume_control: bool,
    /// Seeks are rejected (and fallback voices are not ready) for this long after a voice opens
    pub load_delay: Duration,
    /// Length of every simulated resource in seconds
    pub media_duration: f64,
}

impl Default for VirtualHostConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl VirtualHostConfig {
    /// A multi-channel desktop that decodes mp3, ogg and wav.
    pub fn desktop() -> Self {
        Self {
            platform: "Desktop".to_string(),
            native: true,
            fallback: false,
            playable_types: ["audio/mpeg", "audio/ogg", "audio/wav"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            volume_control: true,
            load_delay: Duration::ZERO,
            media_duration: 600.0,
        }
    }

    /// A platform on the known single-channel list that only decodes mp3.
    pub fn single_channel() -> Self {
        Self {
            platform: "Mozilla/5.0 (iPhone; CPU iPhone OS 4_3 like Mac OS X)".to_string(),
            playable_types: vec!["audio/mpeg".to_string()],
            volume_control: false,
            ..Self::desktop()
        }
    }

    /// No native playback, only the fallback path.
    pub fn fallback_only() -> Self {
        Self {
            native: false,
            fallback: true,
            playable_types: Vec::new(),
            ..Self::desktop()
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }
}

#[derive(Debug)]
struct VoiceState {
    uri: String,
    fallback: bool,
    looping: bool,
    playing: bool,
    anchor_position: f64,
    anchor_time: Duration,
    ready_at: Duration,
    volume: f64,
    seeks: Vec<f64>,
    rejected_seeks: usize,
    play_calls: usize,
}

impl VoiceState {
    fn position(&self, now: Duration, duration: f64) -> f64 {
        if !self.playing {
            return self.anchor_position;
        }
        let elapsed = now.saturating_sub(self.anchor_time).as_secs_f64();
        let raw = self.anchor_position + elapsed;
        if self.looping && duration > 0.0 {
            raw % duration
        } else {
            raw.min(duration)
        }
    }
}

/// Read-only view of a simulated voice, handed out by [`VirtualHost::voices`].
#[derive(Clone)]
pub struct VoiceProbe {
    state: Rc<RefCell<VoiceState>>,
    clock: Rc<dyn Clock>,
    duration: f64,
}

impl VoiceProbe {
    pub fn uri(&self) -> String {
        self.state.borrow().uri.clone()
    }

    pub fn is_fallback(&self) -> bool {
        self.state.borrow().fallback
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position(self.clock.now(), self.duration)
    }

    pub fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    /// Targets of every accepted seek, oldest first.
    pub fn seeks(&self) -> Vec<f64> {
        self.state.borrow().seeks.clone()
    }

    pub fn rejected_seeks(&self) -> usize {
        self.state.borrow().rejected_seeks
    }

    pub fn play_calls(&self) -> usize {
        self.state.borrow().play_calls
    }
}

struct VirtualVoice {
    state: Rc<RefCell<VoiceState>>,
    clock: Rc<dyn Clock>,
    duration: f64,
    volume_control: bool,
}

impl Voice for VirtualVoice {
    fn is_ready(&self) -> bool {
        let state = self.state.borrow();
        !state.fallback || self.clock.now() >= state.ready_at
    }

    fn play(&mut self) {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        state.play_calls += 1;
        if !state.playing {
            state.anchor_time = now;
            state.playing = true;
        }
    }

    fn pause(&mut self) {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        state.anchor_position = state.position(now, self.duration);
        state.playing = false;
    }

    fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    fn set_volume(&mut self, volume: f64) {
        if self.volume_control {
            self.state.borrow_mut().volume = volume;
        }
    }

    fn position(&self) -> f64 {
        self.state.borrow().position(self.clock.now(), self.duration)
    }

    fn seek(&mut self, position: f64) -> Result<(), SeekError> {
        let now = self.clock.now();
        let mut state = self.state.borrow_mut();
        if now < state.ready_at {
            state.rejected_seeks += 1;
            trace!(uri = %state.uri, position, "seek rejected, media still loading");
            return Err(SeekError::NotReady);
        }
        if !(0.0..=self.duration).contains(&position) {
            state.rejected_seeks += 1;
            return Err(SeekError::OutOfRange);
        }
        state.anchor_position = position;
        state.anchor_time = now;
        state.seeks.push(position);
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }
}

/// Simulated host; see the module docs.
pub struct VirtualHost {
    config: VirtualHostConfig,
    clock: Rc<dyn Clock>,
    voices: RefCell<Vec<VoiceProbe>>,
}

impl VirtualHost {
    pub fn new(config: VirtualHostConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            voices: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &VirtualHostConfig {
        &self.config
    }

    /// Every voice opened so far, in opening order.
    pub fn voices(&self) -> Vec<VoiceProbe> {
        self.voices.borrow().clone()
    }

    /// Voices currently producing (simulated) sound.
    pub fn playing_voices(&self) -> usize {
        self.voices.borrow().iter().filter(|v| v.is_playing()).count()
    }

    fn open(&self, uri: &str, looping: bool, fallback: bool) -> Box<dyn Voice> {
        let now = self.clock.now();
        let state = Rc::new(RefCell::new(VoiceState {
            uri: uri.to_string(),
            fallback,
            looping,
            playing: false,
            anchor_position: 0.0,
            anchor_time: now,
            ready_at: now + self.config.load_delay,
            volume: 1.0,
            seeks: Vec::new(),
            rejected_seeks: 0,
            play_calls: 0,
        }));
        self.voices.borrow_mut().push(VoiceProbe {
            state: Rc::clone(&state),
            clock: Rc::clone(&self.clock),
            duration: self.config.media_duration,
        });
        Box::new(VirtualVoice {
            state,
            clock: Rc::clone(&self.clock),
            duration: self.config.media_duration,
            // the fallback bridge always exposes volume
            volume_control: fallback || self.config.volume_control,
        })
    }
}

impl AudioHost for VirtualHost {
    fn platform(&self) -> &str {
        &self.config.platform
    }

    fn native_available(&self) -> bool {
        self.config.native
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.config.native
            && self
                .config
                .playable_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(mime))
    }

    fn volume_control(&self) -> bool {
        self.config.volume_control
    }

    fn fallback_available(&self) -> bool {
        self.config.fallback
    }

    fn open_native(&self, uri: &str, looping: bool) -> Box<dyn Voice> {
        self.open(uri, looping, false)
    }

    fn open_fallback(&self, uri: &str, looping: bool) -> Box<dyn Voice> {
        self.open(uri, looping, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ducks_core::ManualClock;

    fn make_host(config: VirtualHostConfig) -> (Rc<ManualClock>, VirtualHost) {
        let clock = Rc::new(ManualClock::new());
        let host = VirtualHost::new(config, clock.clone());
        (clock, host)
    }

    #[test]
    fn test_position_follows_clock_while_playing() {
        let (clock, host) = make_host(VirtualHostConfig::desktop());
        let mut voice = host.open_native("a.mp3", false);
        voice.seek(10.0).unwrap();
        clock.advance_secs(1.0);
        assert_eq!(voice.position(), 10.0);

        voice.play();
        clock.advance_secs(2.5);
        assert!((voice.position() - 12.5).abs() < 1e-9);

        voice.pause();
        clock.advance_secs(5.0);
        assert!((voice.position() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_seeks_rejected_while_loading() {
        let config = VirtualHostConfig::desktop().with_load_delay(Duration::from_millis(250));
        let (clock, host) = make_host(config);
        let mut voice = host.open_native("a.mp3", false);
        assert_eq!(voice.seek(1.0), Err(SeekError::NotReady));
        clock.advance(Duration::from_millis(250));
        assert_eq!(voice.seek(1.0), Ok(()));

        let probe = &host.voices()[0];
        assert_eq!(probe.seeks(), vec![1.0]);
        assert_eq!(probe.rejected_seeks(), 1);
    }

    #[test]
    fn test_looping_voice_wraps() {
        let mut config = VirtualHostConfig::desktop();
        config.media_duration = 10.0;
        let (clock, host) = make_host(config);
        let mut voice = host.open_native("a.ogg", true);
        voice.play();
        clock.advance_secs(12.0);
        assert!((voice.position() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_voice_not_ready_until_loaded() {
        let config = VirtualHostConfig::fallback_only().with_load_delay(Duration::from_secs(1));
        let (clock, host) = make_host(config);
        let voice = host.open_fallback("a.mp3", false);
        assert!(!voice.is_ready());
        clock.advance_secs(1.0);
        assert!(voice.is_ready());
        assert!(host.voices()[0].is_fallback());
    }

    #[test]
    fn test_can_play_type_requires_native() {
        let (_clock, host) = make_host(VirtualHostConfig::desktop());
        assert!(host.can_play_type("AUDIO/MPEG"));
        assert!(!host.can_play_type("audio/webm"));

        let (_clock, host) = make_host(VirtualHostConfig::fallback_only());
        assert!(!host.can_play_type("audio/mpeg"));
    }
}
