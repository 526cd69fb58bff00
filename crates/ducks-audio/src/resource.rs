//! Picking the one playable file out of a list of per-codec candidates.

use crate::capability::EngineCapabilities;
use crate::error::AudioError;

/// A resolved, playable resource URI. Shared read-only by a unit and its clones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    uri: String,
}

impl Resource {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// File extension of a URI: everything after the last dot, if non-empty.
pub fn extension_of(uri: &str) -> Option<&str> {
    uri.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Return the first candidate whose extension has a detected codec.
pub fn resolve<S: AsRef<str>>(
    candidates: &[S],
    caps: &EngineCapabilities,
) -> Result<Resource, AudioError> {
    candidates
        .iter()
        .map(AsRef::as_ref)
        .find_map(|uri| {
            let ext = extension_of(uri)?;
            caps.supports(ext).then(|| Resource {
                uri: uri.to_string(),
            })
        })
        .ok_or_else(|| {
            AudioError::UnsupportedFormat(
                candidates.iter().map(|c| c.as_ref().to_string()).collect(),
            )
        })
}
