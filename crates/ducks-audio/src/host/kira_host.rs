use std::cell::RefCell;
use std::rc::Rc;

use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackState;
use kira::tween::Tween;
use tracing::{debug, info, warn};

use super::{AudioHost, Voice};
use crate::error::{AudioError, SeekError};

/// Base MIME types kira's symphonia decoders handle.
const DECODABLE: &[&str] = &[
    "audio/mp3",
    "audio/mpeg",
    "audio/mpa",
    "audio/ogg",
    "application/ogg",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
];

type SharedManager = Rc<RefCell<AudioManager<DefaultBackend>>>;

/// Native host backed by kira. There is no secondary playback path.
pub struct KiraHost {
    manager: SharedManager,
    platform: String,
}

impl KiraHost {
    /// Open the default output device.
    pub fn new() -> Result<Self, AudioError> {
        let manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::InitFailed(e.to_string()))?;

        info!("kira audio host initialized");

        Ok(Self {
            manager: Rc::new(RefCell::new(manager)),
            platform: format!("kira/{}", std::env::consts::OS),
        })
    }
}

impl AudioHost for KiraHost {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn native_available(&self) -> bool {
        true
    }

    fn can_play_type(&self, mime: &str) -> bool {
        // codec parameters are ignored, symphonia probes the stream itself
        let base = mime.split(';').next().unwrap_or(mime).trim();
        DECODABLE.iter().any(|t| t.eq_ignore_ascii_case(base))
    }

    fn volume_control(&self) -> bool {
        true
    }

    fn fallback_available(&self) -> bool {
        false
    }

    fn open_native(&self, uri: &str, looping: bool) -> Box<dyn Voice> {
        let data = match StaticSoundData::from_file(uri) {
            Ok(data) => {
                let settings = if looping {
                    StaticSoundSettings::new().loop_region(..)
                } else {
                    StaticSoundSettings::new()
                };
                debug!("Loaded {} ({:.2}s)", uri, data.duration().as_secs_f64());
                Some(data.with_settings(settings))
            }
            Err(e) => {
                warn!("Failed to load '{}': {}", uri, e);
                None
            }
        };

        Box::new(KiraVoice {
            manager: Rc::clone(&self.manager),
            uri: uri.to_string(),
            data,
            handle: None,
            volume: 1.0,
        })
    }

    fn open_fallback(&self, uri: &str, looping: bool) -> Box<dyn Voice> {
        self.open_native(uri, looping)
    }
}

/// One loaded sound. The kira handle only exists once the sound was started,
/// so seeks before the first `play` are rejected as not ready.
struct KiraVoice {
    manager: SharedManager,
    uri: String,
    data: Option<StaticSoundData>,
    handle: Option<StaticSoundHandle>,
    volume: f64,
}

impl Voice for KiraVoice {
    fn play(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            if handle.state() != PlaybackState::Stopped {
                handle.resume(Tween::default());
                return;
            }
        }

        let Some(data) = self.data.clone() else {
            return;
        };

        match self.manager.borrow_mut().play(data) {
            Ok(mut handle) => {
                handle.set_volume(self.volume, Tween::default());
                self.handle = Some(handle);
            }
            Err(e) => warn!("Failed to start '{}': {}", self.uri, e),
        }
    }

    fn pause(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.pause(Tween::default());
        }
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        if let Some(handle) = self.handle.as_mut() {
            handle.set_volume(volume, Tween::default());
        }
    }

    fn position(&self) -> f64 {
        self.handle.as_ref().map_or(0.0, |h| h.position())
    }

    fn seek(&mut self, position: f64) -> Result<(), SeekError> {
        let handle = self.handle.as_mut().ok_or(SeekError::NotReady)?;
        if let Some(data) = &self.data {
            if position > data.duration().as_secs_f64() {
                return Err(SeekError::OutOfRange);
            }
        }
        handle.seek_to(position);
        Ok(())
    }

    fn duration(&self) -> Option<f64> {
        self.data.as_ref().map(|data| data.duration().as_secs_f64())
    }
}
