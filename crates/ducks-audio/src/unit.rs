//! One addressable audio source bound to a resource and its spritemap.

use std::rc::Rc;
use std::time::Duration;

use ducks_core::{Clock, UnitId};
use tracing::{debug, warn};

use crate::backend::{open_backend, AudioBackend};
use crate::capability::BackendKind;
use crate::config::{Autoplay, UnitSettings};
use crate::context::EngineContext;
use crate::error::AudioError;
use crate::resource::{self, Resource};
use crate::sprite::{Pointer, SpriteEntry, Spritemap, STREAM_SPRITE};

/// Result of a `play` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The sprite was started (the seek may still be pending).
    Started,
    /// The unit is busy and the call was not enforced; nothing changed.
    /// The scheduler turns this into a queued request.
    Deferred,
    /// The pointer names no sprite; ignored.
    Unresolved,
}

/// Where a unit is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Idle,
    /// A sprite is targeted but the seek to its start has not gone through yet.
    Seeking,
    Playing,
}

/// What one correction pass did to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Nothing,
    /// Retried the pending seek; carries whether it succeeded.
    SeekRetried(bool),
    /// Passed the end of a looping sprite and restarted it.
    Looped,
    /// Passed the end of a one-shot sprite and stopped.
    Finished,
    /// An idle pooled duplicate; the scheduler should deactivate it.
    IdleClone,
    /// The background track was picked up again.
    BackgroundResumed,
}

/// Background track of a single-channel unit. Foreground sprites interrupt it;
/// afterwards it continues where it would be had it kept running.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMusic {
    pub entry: SpriteEntry,
    /// Clock time of the first activation. Set once, never reset.
    pub started_at: Option<Duration>,
    /// Position of the most recent resume.
    pub last_pointer: Option<f64>,
}

impl BackgroundMusic {
    pub fn new(entry: SpriteEntry) -> Self {
        Self {
            entry,
            started_at: None,
            last_pointer: None,
        }
    }

    /// Position inside the loop at `now`, measured on the wall clock since the
    /// first activation. Drifts from the real audio position if the clock jumps
    /// or playback stalls.
    pub fn elapsed_position(&self, now: Duration) -> f64 {
        let Some(started_at) = self.started_at else {
            return self.entry.start;
        };
        let loop_len = self.entry.duration();
        if loop_len <= 0.0 || !loop_len.is_finite() {
            return self.entry.start;
        }
        let elapsed = now.saturating_sub(started_at).as_secs_f64();
        elapsed % loop_len + self.entry.start
    }
}

/// A playback unit; see the crate docs for the state machine.
pub struct PlaybackUnit {
    id: UnitId,
    origin: Option<UnitId>,
    settings: UnitSettings,
    resource: Rc<Resource>,
    spritemap: Rc<Spritemap>,
    backend: Box<dyn AudioBackend>,
    clock: Rc<dyn Clock>,
    is_playing: Option<SpriteEntry>,
    was_ready: bool,
    last_position: Option<f64>,
    background: Option<BackgroundMusic>,
}

impl PlaybackUnit {
    /// Resolve the resource, open a backend and apply autoplay.
    pub fn new(ctx: &mut EngineContext, settings: UnitSettings) -> Result<Self, AudioError> {
        Self::open(ctx, settings, true).map(|(unit, _)| unit)
    }

    /// Build a unit. With `start` unset autoplay starts nothing: background
    /// music is armed for the next correction, anything else is handed back
    /// as the pointer autoplay would have played.
    pub(crate) fn open(
        ctx: &mut EngineContext,
        settings: UnitSettings,
        start: bool,
    ) -> Result<(Self, Option<Pointer>), AudioError> {
        settings.validate()?;
        let resource = resource::resolve(&settings.resources, ctx.capabilities())?;

        let spritemap = if settings.spritemap.is_empty() {
            Spritemap::whole_stream(settings.looping)
        } else {
            settings.spritemap.clone()
        };
        let stream_loops = settings.looping && settings.spritemap.is_empty();

        let backend = open_backend(
            ctx.capabilities().backend,
            ctx.host(),
            resource.uri(),
            stream_loops,
        );

        let mut unit = Self {
            id: ctx.next_id(),
            origin: None,
            settings,
            resource: Rc::new(resource),
            spritemap: Rc::new(spritemap),
            backend,
            clock: Rc::clone(ctx.clock()),
            is_playing: None,
            was_ready: false,
            last_position: None,
            background: None,
        };

        debug!(
            "Created {} on {} ({} sprites)",
            unit.id,
            unit.resource.uri(),
            unit.spritemap.len()
        );

        let deferred = unit.autoplay(ctx.capabilities().is_single_channel(), start);
        Ok((unit, deferred))
    }

    /// A duplicate of `origin` for overlapping playback. Shares the resolved
    /// resource and spritemap, gets its own backend, never autoplays.
    pub fn clone_of(ctx: &mut EngineContext, origin: &PlaybackUnit) -> Self {
        let settings = origin.settings.for_clone();
        let stream_loops = settings.looping && settings.spritemap.is_empty();
        let backend = open_backend(
            ctx.capabilities().backend,
            ctx.host(),
            origin.resource.uri(),
            stream_loops,
        );

        let unit = Self {
            id: ctx.next_id(),
            origin: Some(origin.id),
            settings,
            resource: Rc::clone(&origin.resource),
            spritemap: Rc::clone(&origin.spritemap),
            backend,
            clock: Rc::clone(ctx.clock()),
            is_playing: None,
            was_ready: false,
            last_position: None,
            background: None,
        };
        debug!("Created clone {} of {}", unit.id, origin.id);
        unit
    }

    fn autoplay(&mut self, single_channel: bool, start: bool) -> Option<Pointer> {
        let pointer = match self.settings.autoplay.clone() {
            Autoplay::Stream(false) => return None,
            Autoplay::Stream(true) => Pointer::Time(0.0),
            Autoplay::Sprite(name) => {
                let Some(entry) = self.spritemap.get(&name).cloned() else {
                    warn!("{}: autoplay sprite '{}' is not in the spritemap", self.id, name);
                    return None;
                };
                if single_channel {
                    debug!("{}: '{}' becomes background music", self.id, name);
                    self.background = Some(BackgroundMusic::new(entry));
                    if start {
                        self.resume_background();
                    }
                    return None;
                }
                Pointer::Sprite(name)
            }
        };

        if !start {
            return Some(pointer);
        }
        self.play(pointer, false);
        None
    }

    // ---- Playback ----

    /// Start a sprite by name or by a timestamp inside it.
    ///
    /// A busy unit ignores non-enforced calls and reports [`PlayOutcome::Deferred`].
    pub fn play(&mut self, pointer: Pointer, enforce: bool) -> PlayOutcome {
        if self.is_playing.is_some() && !enforce {
            return PlayOutcome::Deferred;
        }

        let resolved = self
            .spritemap
            .resolve(&pointer)
            .map(|(entry, position)| (entry.clone(), position));

        match resolved {
            Some((entry, position)) => {
                self.start(entry, position);
                PlayOutcome::Started
            }
            None => {
                debug!("{}: no sprite for {}, ignored", self.id, pointer);
                PlayOutcome::Unresolved
            }
        }
    }

    fn start(&mut self, entry: SpriteEntry, position: f64) {
        self.is_playing = Some(entry);
        self.backend.play();
        // premature seeks fail; the scheduler retries them
        self.was_ready = self.backend.set_current_time(position);
    }

    /// Stop and forget the position. A unit with background music goes back to it.
    pub fn stop(&mut self) {
        self.last_position = None;
        self.is_playing = None;

        if self.background.is_some() {
            self.resume_background();
        } else {
            self.backend.pause();
        }
    }

    /// Halt playback, remembering where it was.
    pub fn pause(&mut self) {
        self.is_playing = None;
        self.last_position = Some(self.backend.current_time());
        self.backend.pause();
    }

    /// Continue from the paused position, or just restart the backend if there is none.
    pub fn resume(&mut self) {
        match self.last_position.take() {
            Some(position) => {
                self.play(Pointer::Time(position), true);
            }
            None => self.backend.play(),
        }
    }

    /// (Re)start the background track: from its start on first activation,
    /// afterwards at the elapsed position.
    pub fn resume_background(&mut self) {
        let now = self.clock.now();
        let Some(background) = self.background.as_mut() else {
            return;
        };

        let position = if background.started_at.is_none() {
            background.started_at = Some(now);
            background.entry.start
        } else {
            let pointer = background.elapsed_position(now);
            background.last_pointer = Some(pointer);
            pointer
        };
        let entry = background.entry.clone();

        debug!("{}: background '{}' at {:.3}s", self.id, entry.name, position);
        self.start(entry, position);
    }

    /// One scheduler correction pass: retry pending seeks, handle sprite ends,
    /// flag idle clones and pick background music back up.
    pub fn correct(&mut self) -> Correction {
        let position = self.backend.current_time();

        match self.is_playing.clone() {
            Some(entry) if !self.was_ready => {
                self.was_ready = self.backend.set_current_time(entry.start);
                if self.was_ready {
                    // a start issued before the backend came up may have been dropped
                    self.backend.play();
                }
                Correction::SeekRetried(self.was_ready)
            }
            Some(entry) if self.clip_ended(&entry, position) => {
                if entry.looping {
                    let start = entry.start;
                    self.start(entry, start);
                    Correction::Looped
                } else {
                    self.stop();
                    Correction::Finished
                }
            }
            Some(_) => Correction::Nothing,
            None if self.is_clone() => Correction::IdleClone,
            None => match &self.background {
                Some(background)
                    if background.started_at.is_none() || position > background.entry.end =>
                {
                    self.resume_background();
                    Correction::BackgroundResumed
                }
                _ => Correction::Nothing,
            },
        }
    }

    /// Whether playback ran past the end of `entry`. The open-ended stream
    /// sprite ends when a non-looping voice reaches the end of the media.
    fn clip_ended(&self, entry: &SpriteEntry, position: f64) -> bool {
        if entry.end.is_finite() {
            return position > entry.end;
        }
        !entry.looping
            && self
                .backend
                .duration()
                .is_some_and(|length| position >= length)
    }

    /// Stop the backend for good; used when the unit is destroyed.
    pub(crate) fn halt(&mut self) {
        self.is_playing = None;
        self.background = None;
        self.last_position = None;
        self.backend.pause();
    }

    // ---- Volume / position ----

    pub fn volume(&self) -> f64 {
        self.backend.volume()
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.backend.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn current_time(&self) -> f64 {
        self.backend.current_time()
    }

    pub fn set_current_time(&mut self, time: f64) -> bool {
        self.backend.set_current_time(time)
    }

    // ---- Accessors ----

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// The unit this one duplicates, if it is a clone.
    pub fn origin(&self) -> Option<UnitId> {
        self.origin
    }

    pub fn is_clone(&self) -> bool {
        self.origin.is_some()
    }

    /// The sprite currently targeted.
    pub fn is_playing(&self) -> Option<&SpriteEntry> {
        self.is_playing.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.is_playing.is_none()
    }

    pub fn was_ready(&self) -> bool {
        self.was_ready
    }

    pub fn state(&self) -> UnitState {
        match (&self.is_playing, self.was_ready) {
            (None, _) => UnitState::Idle,
            (Some(_), false) => UnitState::Seeking,
            (Some(_), true) => UnitState::Playing,
        }
    }

    pub fn background(&self) -> Option<&BackgroundMusic> {
        self.background.as_ref()
    }

    pub fn last_position(&self) -> Option<f64> {
        self.last_position
    }

    /// Hand over the paused position, leaving none behind.
    pub(crate) fn take_last_position(&mut self) -> Option<f64> {
        self.last_position.take()
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn spritemap(&self) -> &Spritemap {
        &self.spritemap
    }

    pub fn settings(&self) -> &UnitSettings {
        &self.settings
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Whether the unit plays the implicit whole-stream sprite.
    pub fn is_stream(&self) -> bool {
        self.spritemap.len() == 1 && self.spritemap.get(STREAM_SPRITE).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{BackendKind, EngineCapabilities};
    use crate::config::EngineConfig;
    use crate::host::{VirtualHost, VirtualHostConfig};
    use ducks_core::ManualClock;

    fn context(config: VirtualHostConfig) -> (Rc<ManualClock>, Rc<VirtualHost>, EngineContext) {
        let clock = Rc::new(ManualClock::new());
        let host = Rc::new(VirtualHost::new(config, clock.clone()));
        let ctx = EngineContext::new(host.clone(), clock.clone(), &EngineConfig::default()).unwrap();
        (clock, host, ctx)
    }

    fn sprites() -> Spritemap {
        Spritemap::new()
            .with("music", 0.0, 63.94, true)
            .and_then(|m| m.with("pickup", 65.0, 66.47, false))
            .and_then(|m| m.with("quack", 68.0, 68.6, false))
            .unwrap()
    }

    fn settings() -> UnitSettings {
        UnitSettings::new(["ducks.ogg", "ducks.mp3"]).with_spritemap(sprites())
    }

    #[test]
    fn test_construction_resolves_resource() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::single_channel());
        let unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        assert_eq!(unit.resource().uri(), "ducks.mp3");
        assert_eq!(unit.state(), UnitState::Idle);
        assert!(!unit.is_clone());
        assert_eq!(host.voices().len(), 1);
    }

    #[test]
    fn test_construction_fails_without_playable_resource() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::single_channel());
        let result = PlaybackUnit::new(&mut ctx, UnitSettings::new(["ducks.ogg", "ducks.wav"]));
        assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_play_by_name_and_timestamp() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();

        assert_eq!(unit.play(Pointer::from("pickup"), false), PlayOutcome::Started);
        assert_eq!(unit.is_playing().unwrap().name, "pickup");
        assert_eq!(unit.state(), UnitState::Playing);
        assert_eq!(host.voices()[0].seeks(), vec![65.0]);

        assert_eq!(unit.play(Pointer::Time(68.2), true), PlayOutcome::Started);
        assert_eq!(unit.is_playing().unwrap().name, "quack");
        assert_eq!(host.voices()[0].seeks(), vec![65.0, 68.2]);
    }

    #[test]
    fn test_busy_unit_defers_without_side_effects() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        unit.play(Pointer::from("pickup"), false);

        assert_eq!(unit.play(Pointer::from("quack"), false), PlayOutcome::Deferred);
        assert_eq!(unit.is_playing().unwrap().name, "pickup");
        assert_eq!(host.voices()[0].seeks().len(), 1);
    }

    #[test]
    fn test_unresolved_pointer_is_ignored() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        assert_eq!(unit.play(Pointer::from("honk"), false), PlayOutcome::Unresolved);
        assert_eq!(unit.play(Pointer::Time(64.5), false), PlayOutcome::Unresolved);
        assert!(unit.is_idle());
        assert_eq!(host.voices()[0].play_calls(), 0);
    }

    #[test]
    fn test_premature_seek_leaves_unit_seeking() {
        let config = VirtualHostConfig::desktop().with_load_delay(Duration::from_millis(300));
        let (clock, _host, mut ctx) = context(config);
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();

        unit.play(Pointer::from("quack"), false);
        assert_eq!(unit.state(), UnitState::Seeking);
        assert_eq!(unit.correct(), Correction::SeekRetried(false));

        clock.advance(Duration::from_millis(300));
        assert_eq!(unit.correct(), Correction::SeekRetried(true));
        assert_eq!(unit.state(), UnitState::Playing);
        assert!((unit.current_time() - 68.0).abs() < 1e-9);
    }

    #[test]
    fn test_pause_and_resume() {
        let (clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        unit.play(Pointer::from("music"), false);
        clock.advance_secs(12.25);

        unit.pause();
        assert!(unit.is_idle());
        assert!((unit.last_position().unwrap() - 12.25).abs() < 1e-9);

        clock.advance_secs(30.0);
        unit.resume();
        assert_eq!(unit.is_playing().unwrap().name, "music");
        assert!(unit.last_position().is_none());
        assert!((unit.current_time() - 12.25).abs() < 1e-9);
    }

    #[test]
    fn test_stop_forgets_position() {
        let (clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        unit.play(Pointer::from("music"), false);
        clock.advance_secs(1.0);
        unit.stop();
        assert!(unit.is_idle());
        assert!(unit.last_position().is_none());
        assert!(!host.voices()[0].is_playing());

        // bare restart of the backend
        unit.resume();
        assert!(host.voices()[0].is_playing());
        assert!(unit.is_idle());
    }

    #[test]
    fn test_sprite_end_stops_or_loops() {
        let (clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();

        unit.play(Pointer::from("quack"), false);
        clock.advance_secs(0.5);
        assert_eq!(unit.correct(), Correction::Nothing);
        clock.advance_secs(0.2);
        assert_eq!(unit.correct(), Correction::Finished);
        assert_eq!(unit.state(), UnitState::Idle);

        unit.play(Pointer::from("music"), false);
        clock.advance_secs(64.0);
        assert_eq!(unit.correct(), Correction::Looped);
        assert_eq!(unit.is_playing().unwrap().name, "music");
        assert!(unit.current_time() < 0.01);
    }

    #[test]
    fn test_volume_passthrough_and_clamp() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        assert_eq!(unit.volume(), 1.0);
        unit.set_volume(0.4);
        assert!((unit.volume() - 0.4).abs() < 1e-9);
        unit.set_volume(7.0);
        assert_eq!(unit.volume(), 1.0);
    }

    #[test]
    fn test_volume_ignored_without_volume_control() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::single_channel());
        let mut unit = PlaybackUnit::new(&mut ctx, settings()).unwrap();
        unit.set_volume(0.2);
        assert_eq!(unit.volume(), 1.0);
    }

    #[test]
    fn test_autoplay_sprite_multi_channel() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = settings().with_autoplay(Autoplay::Sprite("music".into()));
        let unit = PlaybackUnit::new(&mut ctx, settings).unwrap();
        assert_eq!(unit.is_playing().unwrap().name, "music");
        assert!(unit.background().is_none());
    }

    #[test]
    fn test_autoplay_sprite_single_channel_becomes_background() {
        let (clock, _host, mut ctx) = context(VirtualHostConfig::single_channel());
        clock.advance_secs(5.0);
        let settings = settings().with_autoplay(Autoplay::Sprite("music".into()));
        let unit = PlaybackUnit::new(&mut ctx, settings).unwrap();

        let background = unit.background().unwrap();
        assert_eq!(background.entry.name, "music");
        assert_eq!(background.started_at, Some(Duration::from_secs(5)));
        assert_eq!(unit.is_playing().unwrap().name, "music");
    }

    #[test]
    fn test_deferred_autoplay_starts_nothing() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = settings().with_autoplay(Autoplay::Sprite("music".into()));
        let (unit, deferred) = PlaybackUnit::open(&mut ctx, settings, false).unwrap();
        assert!(unit.is_idle());
        assert_eq!(deferred, Some(Pointer::from("music")));
    }

    #[test]
    fn test_deferred_background_starts_on_correction() {
        let (clock, host, mut ctx) = context(VirtualHostConfig::single_channel());
        let settings = settings().with_autoplay(Autoplay::Sprite("music".into()));
        let (mut unit, deferred) = PlaybackUnit::open(&mut ctx, settings, false).unwrap();
        assert!(deferred.is_none());
        assert!(unit.is_idle());
        assert!(unit.background().unwrap().started_at.is_none());

        clock.advance_secs(3.0);
        assert_eq!(unit.correct(), Correction::BackgroundResumed);
        assert_eq!(unit.is_playing().unwrap().name, "music");
        assert_eq!(unit.background().unwrap().started_at, Some(Duration::from_secs(3)));
        assert_eq!(host.voices()[0].seeks(), vec![0.0]);
    }

    #[test]
    fn test_unknown_autoplay_sprite_is_ignored() {
        let (_clock, _host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = settings().with_autoplay(Autoplay::Sprite("nope".into()));
        let unit = PlaybackUnit::new(&mut ctx, settings).unwrap();
        assert!(unit.is_idle());
    }

    #[test]
    fn test_autoplay_stream_without_spritemap() {
        let (clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = UnitSettings::new(["theme.ogg"])
            .with_autoplay(Autoplay::Stream(true))
            .with_loop(true);
        let mut unit = PlaybackUnit::new(&mut ctx, settings).unwrap();
        assert!(unit.is_stream());
        assert_eq!(unit.is_playing().unwrap().name, STREAM_SPRITE);

        // the implicit sprite never ends; the voice itself wraps
        clock.advance_secs(601.0);
        assert_eq!(unit.correct(), Correction::Nothing);
        assert!((host.voices()[0].position() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stream_without_loop_ends_with_media() {
        let (clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = UnitSettings::new(["theme.ogg"]).with_autoplay(Autoplay::Stream(true));
        let mut unit = PlaybackUnit::new(&mut ctx, settings).unwrap();

        clock.advance_secs(599.0);
        assert_eq!(unit.correct(), Correction::Nothing);

        clock.advance_secs(101.0);
        assert_eq!(unit.correct(), Correction::Finished);
        assert_eq!(unit.state(), UnitState::Idle);
        assert!(!host.voices()[0].is_playing());

        assert_eq!(unit.play(Pointer::Time(0.0), false), PlayOutcome::Started);
    }

    #[test]
    fn test_background_elapsed_position() {
        let mut background = BackgroundMusic::new(SpriteEntry::new("music", 2.0, 12.0, true));
        assert_eq!(background.elapsed_position(Duration::from_secs(100)), 2.0);

        background.started_at = Some(Duration::from_secs(10));
        assert!((background.elapsed_position(Duration::from_secs(13)) - 5.0).abs() < 1e-9);
        assert!((background.elapsed_position(Duration::from_secs(35)) - 7.0).abs() < 1e-9);
        // clock went backwards
        assert_eq!(background.elapsed_position(Duration::from_secs(1)), 2.0);
    }

    #[test]
    fn test_clone_shares_resource_and_sprites() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::desktop());
        let settings = settings().with_autoplay(Autoplay::Sprite("music".into()));
        let origin = PlaybackUnit::new(&mut ctx, settings).unwrap();
        let clone = PlaybackUnit::clone_of(&mut ctx, &origin);

        assert_eq!(clone.origin(), Some(origin.id()));
        assert!(clone.is_clone());
        assert!(clone.is_idle());
        assert!(clone.settings().autoplay.is_off());
        assert!(Rc::ptr_eq(&clone.resource, &origin.resource));
        assert!(Rc::ptr_eq(&clone.spritemap, &origin.spritemap));
        assert_eq!(host.voices().len(), 2);
        assert_eq!(host.voices()[1].uri(), origin.resource().uri());
    }

    #[test]
    fn test_fallback_backend_selected() {
        let (_clock, host, mut ctx) = context(VirtualHostConfig::fallback_only());
        let unit = PlaybackUnit::new(&mut ctx, UnitSettings::new(["ducks.ogg", "ducks.mp3"])).unwrap();
        assert_eq!(unit.backend_kind(), BackendKind::Fallback);
        assert!(host.voices()[0].is_fallback());
    }

    #[test]
    fn test_injected_capabilities() {
        let clock = Rc::new(ManualClock::new());
        let host = Rc::new(VirtualHost::new(VirtualHostConfig::desktop(), clock.clone()));
        let mut caps: EngineCapabilities = crate::capability::detect(host.as_ref(), false).unwrap();
        caps.channel_count = 2;
        let mut ctx = EngineContext::with_capabilities(host, clock, caps);
        assert_eq!(ctx.capabilities().channel_count, 2);
        assert!(PlaybackUnit::new(&mut ctx, settings()).is_ok());
    }
}
