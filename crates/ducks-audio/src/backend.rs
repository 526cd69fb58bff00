//! The capability set a playback unit drives, with one implementation per
//! playback path. A unit picks its backend once, at construction.

use tracing::trace;

use crate::capability::BackendKind;
use crate::host::{AudioHost, Voice};

/// Volume reported when the backend cannot be asked yet.
pub const DEFAULT_VOLUME: f64 = 1.0;

/// Transport and volume control for one unit. No call fails: missing media
/// yields defaults, and a refused seek is reported as `false`.
pub trait AudioBackend {
    fn kind(&self) -> BackendKind;

    fn play(&mut self);

    fn pause(&mut self);

    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    fn current_time(&self) -> f64;

    /// Returns whether the seek took effect.
    fn set_current_time(&mut self, time: f64) -> bool;

    /// Media length in seconds, `None` while unknown.
    fn duration(&self) -> Option<f64>;
}

/// Drives a native voice directly. Transport commands are always forwarded;
/// the media element queues them until it has loaded.
pub struct NativeBackend {
    voice: Box<dyn Voice>,
}

impl NativeBackend {
    pub fn new(voice: Box<dyn Voice>) -> Self {
        Self { voice }
    }
}

impl AudioBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn play(&mut self) {
        self.voice.play();
    }

    fn pause(&mut self) {
        self.voice.pause();
    }

    fn volume(&self) -> f64 {
        if self.voice.is_ready() {
            self.voice.volume()
        } else {
            DEFAULT_VOLUME
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.voice.set_volume(volume);
    }

    fn current_time(&self) -> f64 {
        self.voice.position()
    }

    fn set_current_time(&mut self, time: f64) -> bool {
        match self.voice.seek(time) {
            Ok(()) => true,
            Err(e) => {
                trace!("native seek to {:.3}s refused: {}", time, e);
                false
            }
        }
    }

    fn duration(&self) -> Option<f64> {
        self.voice.duration()
    }
}

/// Drives a fallback voice whose control bridge comes up asynchronously.
/// Until the bridge is ready every call is answered with defaults.
pub struct FallbackBackend {
    voice: Box<dyn Voice>,
}

impl FallbackBackend {
    pub fn new(voice: Box<dyn Voice>) -> Self {
        Self { voice }
    }
}

impl AudioBackend for FallbackBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    fn play(&mut self) {
        if self.voice.is_ready() {
            self.voice.play();
        }
    }

    fn pause(&mut self) {
        if self.voice.is_ready() {
            self.voice.pause();
        }
    }

    fn volume(&self) -> f64 {
        if self.voice.is_ready() {
            self.voice.volume()
        } else {
            DEFAULT_VOLUME
        }
    }

    fn set_volume(&mut self, volume: f64) {
        if self.voice.is_ready() {
            self.voice.set_volume(volume);
        }
    }

    fn current_time(&self) -> f64 {
        if self.voice.is_ready() {
            self.voice.position()
        } else {
            0.0
        }
    }

    fn set_current_time(&mut self, time: f64) -> bool {
        self.voice.is_ready() && self.voice.seek(time).is_ok()
    }

    fn duration(&self) -> Option<f64> {
        if self.voice.is_ready() {
            self.voice.duration()
        } else {
            None
        }
    }
}

/// Open the backend matching the detected playback path.
pub fn open_backend(
    kind: BackendKind,
    host: &dyn AudioHost,
    uri: &str,
    looping: bool,
) -> Box<dyn AudioBackend> {
    match kind {
        BackendKind::Native => Box::new(NativeBackend::new(host.open_native(uri, looping))),
        BackendKind::Fallback => Box::new(FallbackBackend::new(host.open_fallback(uri, looping))),
    }
}
