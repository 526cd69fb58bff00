use std::rc::Rc;
use std::time::Duration;

use ducks_core::{Clock, IdAllocator, UnitId};

use crate::capability::{self, EngineCapabilities};
use crate::config::EngineConfig;
use crate::error::AudioError;
use crate::host::AudioHost;

/// Everything a playback unit needs from its surroundings: the probed
/// capabilities, the host to open voices on, the clock and the id source.
///
/// Built once per process and handed to the scheduler; the capabilities
/// never change after construction.
pub struct EngineContext {
    capabilities: EngineCapabilities,
    host: Rc<dyn AudioHost>,
    clock: Rc<dyn Clock>,
    ids: IdAllocator,
}

impl EngineContext {
    /// Probe the host and build the context.
    pub fn new(
        host: Rc<dyn AudioHost>,
        clock: Rc<dyn Clock>,
        config: &EngineConfig,
    ) -> Result<Self, AudioError> {
        let capabilities = capability::detect(host.as_ref(), config.enforce_fallback_backend)?;
        Ok(Self::with_capabilities(host, clock, capabilities))
    }

    /// Build a context around capabilities that are already known.
    pub fn with_capabilities(
        host: Rc<dyn AudioHost>,
        clock: Rc<dyn Clock>,
        capabilities: EngineCapabilities,
    ) -> Self {
        Self {
            capabilities,
            host,
            clock,
            ids: IdAllocator::new(),
        }
    }

    pub fn capabilities(&self) -> &EngineCapabilities {
        &self.capabilities
    }

    pub fn host(&self) -> &dyn AudioHost {
        self.host.as_ref()
    }

    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub(crate) fn next_id(&mut self) -> UnitId {
        self.ids.allocate()
    }
}
