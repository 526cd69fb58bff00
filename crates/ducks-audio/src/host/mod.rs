//! The environment the engine runs in: codec queries, platform identity and the
//! playback primitives ("voices") the backends drive.

#[cfg(feature = "kira")]
mod kira_host;
mod virtual_host;

#[cfg(feature = "kira")]
pub use kira_host::KiraHost;
pub use virtual_host::{VirtualHost, VirtualHostConfig, VoiceProbe};

use crate::error::SeekError;

/// One playable stream bound to a single resource.
///
/// Calls are fire-and-forget: `play` and `seek` may take effect late or, for
/// `seek`, be rejected while the media is still loading.
pub trait Voice {
    /// Whether the voice can be controlled yet. Hosts whose playback bridge loads
    /// asynchronously report `false` until it is up.
    fn is_ready(&self) -> bool {
        true
    }

    fn play(&mut self);

    fn pause(&mut self);

    /// Current volume, 0.0 to 1.0.
    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    fn seek(&mut self, position: f64) -> Result<(), SeekError>;

    /// Length of the media in seconds, once known.
    fn duration(&self) -> Option<f64> {
        None
    }
}

/// Host environment queried once by the capability probe and then used to open voices.
pub trait AudioHost {
    /// Platform identification string, matched against the known single-channel platforms.
    fn platform(&self) -> &str;

    /// Whether the native playback path exists at all.
    fn native_available(&self) -> bool;

    /// Whether the native path can decode the given MIME type.
    fn can_play_type(&self, mime: &str) -> bool;

    /// Whether native voices honor volume changes.
    fn volume_control(&self) -> bool;

    /// Whether the secondary (fallback) playback path exists.
    fn fallback_available(&self) -> bool;

    /// Open a native voice for `uri`. `looping` asks the voice to wrap at the end of the stream.
    fn open_native(&self, uri: &str, looping: bool) -> Box<dyn Voice>;

    /// Open a fallback voice for `uri`.
    fn open_fallback(&self, uri: &str, looping: bool) -> Box<dyn Voice>;
}
