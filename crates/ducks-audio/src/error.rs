use ducks_core::UnitId;

/// Errors that can occur in the audio system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    #[error("none of the resources can be played on this platform: {0:?}")]
    UnsupportedFormat(Vec<String>),

    #[error("no audio backend available (neither native nor fallback)")]
    NoBackend,

    #[error("failed to initialize audio host: {0}")]
    InitFailed(String),

    #[error("invalid unit settings: {0}")]
    InvalidSettings(String),

    #[error("unknown playback unit {0}")]
    UnknownUnit(UnitId),
}

/// Why a host refused a seek. Never surfaced to callers; it only feeds `was_ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SeekError {
    #[error("media is not ready for seeking yet")]
    NotReady,

    #[error("seek target lies outside the media")]
    OutOfRange,
}
