//! One-time detection of the usable backend, codecs and channel count.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::AudioError;
use crate::host::AudioHost;

/// Candidate MIME types per file extension, most specific first.
pub const MIME_TABLE: &[(&str, &[&str])] = &[
    ("3gp", &["audio/3gpp", "audio/amr"]),
    ("aac", &["audio/aac", "audio/aacp"]),
    ("amr", &["audio/amr", "audio/3gpp"]),
    (
        "m4a",
        &[
            "audio/mp4",
            "audio/mp4; codecs=\"mp4a.40.2,avc1.42E01E\"",
            "audio/mpeg4",
            "audio/mpeg4-generic",
            "audio/mp4a-latm",
            "audio/MP4A-LATM",
            "audio/x-m4a",
        ],
    ),
    (
        "mp3",
        &[
            "audio/mp3",
            "audio/mpeg",
            "audio/mpeg; codecs=\"mp3\"",
            "audio/MPA",
            "audio/mpa-robust",
        ],
    ),
    ("mpga", &["audio/MPA", "audio/mpa-robust", "audio/mpeg", "video/mpeg"]),
    ("mp4", &["audio/mp4", "video/mp4"]),
    (
        "ogg",
        &[
            "application/ogg",
            "audio/ogg",
            "audio/ogg; codecs=\"theora, vorbis\"",
            "video/ogg",
            "video/ogg; codecs=\"theora, vorbis\"",
        ],
    ),
    (
        "wav",
        &[
            "audio/wave",
            "audio/wav",
            "audio/wav; codecs=\"1\"",
            "audio/x-wav",
            "audio/x-pn-wav",
        ],
    ),
    ("webm", &["audio/webm", "audio/webm; codecs=\"vorbis\"", "video/webm"]),
];

/// The native backend only counts as usable if one of these decodes.
const NATIVE_REQUIRED: &[&str] = &["mp3", "ogg", "webm", "wav"];

/// Codecs every fallback implementation handles.
pub const FALLBACK_CODECS: &[(&str, &str)] = &[
    ("mp3", "audio/mp3"),
    ("mpga", "audio/mpeg"),
    ("mp4", "audio/mp4"),
    ("m4a", "audio/mp4"),
    ("3gp", "audio/3gpp"),
    ("amr", "audio/amr"),
];

/// Channels the native backend gets everywhere except on known single-channel platforms.
pub const DEFAULT_CHANNELS: usize = 8;

/// Which playback path the engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    Native,
    Fallback,
}

/// Result of the capability probe. Computed once per engine and never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineCapabilities {
    /// Extension → chosen MIME type, `None` if the extension cannot be decoded
    pub codecs: BTreeMap<String, Option<String>>,
    /// Number of sounds that may play at once (at least 1)
    pub channel_count: usize,
    pub volume_control: bool,
    pub backend: BackendKind,
}

impl EngineCapabilities {
    /// Whether resources with this extension can be played.
    pub fn supports(&self, extension: &str) -> bool {
        self.mime_for(extension).is_some()
    }

    pub fn mime_for(&self, extension: &str) -> Option<&str> {
        self.codecs.get(extension).and_then(|m| m.as_deref())
    }

    /// Playable extensions in alphabetical order.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.codecs
            .iter()
            .filter(|(_, mime)| mime.is_some())
            .map(|(ext, _)| ext.as_str())
            .collect()
    }

    pub fn is_single_channel(&self) -> bool {
        self.channel_count == 1
    }
}

/// Platforms whose native playback cannot run two sounds at once.
pub fn is_single_channel_platform(platform: &str) -> bool {
    let lower = platform.to_ascii_lowercase();
    platform.contains("MSIE 9.0")
        || ["iphone", "ipod", "ipad"].iter().any(|p| lower.contains(p))
}

/// Probe the host. `enforce_fallback` skips the native backend entirely and
/// selects the fallback path even when the host does not advertise one.
pub fn detect(host: &dyn AudioHost, enforce_fallback: bool) -> Result<EngineCapabilities, AudioError> {
    let mut codecs: BTreeMap<String, Option<String>> = MIME_TABLE
        .iter()
        .map(|(ext, _)| (ext.to_string(), None))
        .collect();
    let mut channel_count = DEFAULT_CHANNELS;
    let mut volume_control = false;
    let mut native_usable = false;

    if host.native_available() && !enforce_fallback {
        for (ext, mimes) in MIME_TABLE {
            if let Some(mime) = mimes.iter().find(|m| host.can_play_type(m)) {
                debug!("Codec {} -> {}", ext, mime);
                codecs.insert(ext.to_string(), Some(mime.to_string()));
            }
        }

        native_usable = NATIVE_REQUIRED
            .iter()
            .any(|ext| codecs.get(*ext).is_some_and(Option::is_some));
        volume_control = host.volume_control();

        if is_single_channel_platform(host.platform()) {
            channel_count = 1;
        }
    }

    let backend = if native_usable {
        BackendKind::Native
    } else if host.fallback_available() || enforce_fallback {
        // a forced fallback counts as present
        codecs.values_mut().for_each(|mime| *mime = None);
        for (ext, mime) in FALLBACK_CODECS {
            codecs.insert(ext.to_string(), Some(mime.to_string()));
        }
        volume_control = true;
        channel_count = 1;
        BackendKind::Fallback
    } else {
        return Err(AudioError::NoBackend);
    };

    let caps = EngineCapabilities {
        codecs,
        channel_count,
        volume_control,
        backend,
    };

    info!(
        "Audio capabilities: backend={:?} channels={} volume={} codecs={:?}",
        caps.backend,
        caps.channel_count,
        caps.volume_control,
        caps.supported_extensions()
    );

    Ok(caps)
}
