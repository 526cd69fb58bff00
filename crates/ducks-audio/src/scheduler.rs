//! The engine loop: owns every unit, drains the request queue into free
//! channels and corrects playback positions once per tick.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use ducks_core::{Clock, UnitId};
use tracing::{debug, info, trace, warn};

use crate::capability::{BackendKind, EngineCapabilities};
use crate::config::{EngineConfig, UnitSettings};
use crate::context::EngineContext;
use crate::error::AudioError;
use crate::host::AudioHost;
use crate::pool::ClonePool;
use crate::queue::RequestQueue;
use crate::sprite::Pointer;
use crate::unit::{Correction, PlayOutcome, PlaybackUnit, UnitState};

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Clone (multi-channel) or origin (single-channel) that took a queued request.
    pub promoted: Option<UnitId>,
    /// Queued requests discarded because their unit no longer exists.
    pub dropped: usize,
    /// Corrections applied, in active-set order. `Nothing` is omitted.
    pub corrections: Vec<(UnitId, Correction)>,
    /// Idle clones taken out of the active set.
    pub deactivated: Vec<UnitId>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.promoted.is_none()
            && self.dropped == 0
            && self.corrections.is_empty()
            && self.deactivated.is_empty()
    }

    /// The correction applied to `id` this tick, if any.
    pub fn correction_for(&self, id: UnitId) -> Option<Correction> {
        self.corrections
            .iter()
            .find(|(unit, _)| *unit == id)
            .map(|(_, correction)| *correction)
    }
}

/// Owner of all playback units and the periodic tick.
///
/// Everything runs on the caller's thread: caller operations and ticks are
/// plain method calls, and [`Scheduler::run_until`] is only a convenience
/// driver around [`Scheduler::tick`].
pub struct Scheduler {
    ctx: EngineContext,
    config: EngineConfig,
    units: BTreeMap<UnitId, PlaybackUnit>,
    pool: ClonePool,
    queue: RequestQueue,
    active: BTreeSet<UnitId>,
    ticks: u64,
}

impl Scheduler {
    /// Probe the host and start an empty engine.
    pub fn new(
        host: Rc<dyn AudioHost>,
        clock: Rc<dyn Clock>,
        config: EngineConfig,
    ) -> Result<Self, AudioError> {
        let ctx = EngineContext::new(host, clock, &config)?;
        Ok(Self::from_context(ctx, config))
    }

    /// Start an engine around an existing context.
    pub fn from_context(ctx: EngineContext, config: EngineConfig) -> Self {
        info!(
            "Audio scheduler ready ({} channels, tick every {:?})",
            ctx.capabilities().channel_count,
            config.tick_interval()
        );
        Self {
            ctx,
            config,
            units: BTreeMap::new(),
            pool: ClonePool::new(),
            queue: RequestQueue::new(),
            active: BTreeSet::new(),
            ticks: 0,
        }
    }

    // ---- Registry ----

    /// Build a unit, register it and mark it active. With every channel taken
    /// its autoplay waits: background music for the next free tick, anything
    /// else in the request queue.
    pub fn create_unit(&mut self, settings: UnitSettings) -> Result<UnitId, AudioError> {
        if settings.enforce_fallback_backend && self.ctx.capabilities().backend != BackendKind::Fallback
        {
            warn!(
                "Unit requested the fallback backend, engine runs {:?}",
                self.ctx.capabilities().backend
            );
        }

        let full = self.channels_full();
        let (unit, deferred) = PlaybackUnit::open(&mut self.ctx, settings, !full)?;
        let id = unit.id();
        self.units.insert(id, unit);
        self.active.insert(id);

        if let Some(pointer) = deferred {
            debug!("{}: all channels busy, autoplay of {} queued", id, pointer);
            self.queue.enqueue(pointer, id);
        }
        info!("Registered {}", id);
        Ok(id)
    }

    /// Halt and remove a unit together with its clones. Requests still queued
    /// for it are discarded when they reach the front of the queue.
    pub fn destroy(&mut self, id: UnitId) -> Result<(), AudioError> {
        let mut unit = self.units.remove(&id).ok_or(AudioError::UnknownUnit(id))?;
        unit.halt();
        self.active.remove(&id);
        for clone in self.pool.remove_origin(id) {
            self.active.remove(&clone);
        }
        info!("Destroyed {}", id);
        Ok(())
    }

    // ---- Caller operations ----

    /// Play a sprite (by name) or a timestamp on a registered unit. A busy unit
    /// queues the request unless `enforce` is set. An idle unit queues it too
    /// while every channel is taken, enforced or not.
    pub fn play(
        &mut self,
        id: UnitId,
        pointer: impl Into<Pointer>,
        enforce: bool,
    ) -> Result<PlayOutcome, AudioError> {
        let pointer = pointer.into();
        let full = self.channels_full();
        let unit = self.units.get_mut(&id).ok_or(AudioError::UnknownUnit(id))?;
        let outcome = if full && unit.is_idle() {
            match unit.spritemap().resolve(&pointer) {
                Some(_) => PlayOutcome::Deferred,
                None => PlayOutcome::Unresolved,
            }
        } else {
            unit.play(pointer.clone(), enforce)
        };
        if outcome == PlayOutcome::Deferred {
            self.queue.enqueue(pointer, id);
        }
        Ok(outcome)
    }

    pub fn stop(&mut self, id: UnitId) -> Result<(), AudioError> {
        self.unit_mut(id)?.stop();
        Ok(())
    }

    pub fn pause(&mut self, id: UnitId) -> Result<(), AudioError> {
        self.unit_mut(id)?.pause();
        Ok(())
    }

    /// Continue a paused unit. Without a free channel the paused position is
    /// queued like any other play.
    pub fn resume(&mut self, id: UnitId) -> Result<(), AudioError> {
        let full = self.channels_full();
        let unit = self.units.get_mut(&id).ok_or(AudioError::UnknownUnit(id))?;
        if !(full && unit.is_idle()) {
            unit.resume();
            return Ok(());
        }

        match unit.take_last_position() {
            Some(position) => self.queue.enqueue(Pointer::Time(position), id),
            None => debug!("{}: nothing to resume and no free channel", id),
        }
        Ok(())
    }

    pub fn volume(&self, id: UnitId) -> Result<f64, AudioError> {
        Ok(self.unit_ref(id)?.volume())
    }

    pub fn set_volume(&mut self, id: UnitId, volume: f64) -> Result<(), AudioError> {
        self.unit_mut(id)?.set_volume(volume);
        Ok(())
    }

    pub fn current_time(&self, id: UnitId) -> Result<f64, AudioError> {
        Ok(self.unit_ref(id)?.current_time())
    }

    /// Seek a unit. `Ok(false)` means the backend refused the seek for now.
    pub fn set_current_time(&mut self, id: UnitId, time: f64) -> Result<bool, AudioError> {
        Ok(self.unit_mut(id)?.set_current_time(time))
    }

    // ---- Introspection ----

    /// A registered unit or a pooled clone.
    pub fn unit(&self, id: UnitId) -> Option<&PlaybackUnit> {
        self.units.get(&id).or_else(|| self.pool.get(id))
    }

    pub fn unit_state(&self, id: UnitId) -> Option<UnitState> {
        self.unit(id).map(PlaybackUnit::state)
    }

    /// Registered units, in creation order.
    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.keys().copied()
    }

    pub fn clones_of(&self, origin: UnitId) -> Vec<UnitId> {
        self.pool.clones_of(origin)
    }

    pub fn is_active(&self, id: UnitId) -> bool {
        self.active.contains(&id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Units and clones currently holding a channel (seeking or playing).
    pub fn channels_in_use(&self) -> usize {
        self.units
            .values()
            .chain(self.pool.iter())
            .filter(|unit| !unit.is_idle())
            .count()
    }

    fn channels_full(&self) -> bool {
        self.channels_in_use() >= self.ctx.capabilities().channel_count
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn clone_count(&self) -> usize {
        self.pool.len()
    }

    pub fn capabilities(&self) -> &EngineCapabilities {
        self.ctx.capabilities()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn unit_ref(&self, id: UnitId) -> Result<&PlaybackUnit, AudioError> {
        self.units.get(&id).ok_or(AudioError::UnknownUnit(id))
    }

    fn unit_mut(&mut self, id: UnitId) -> Result<&mut PlaybackUnit, AudioError> {
        self.units.get_mut(&id).ok_or(AudioError::UnknownUnit(id))
    }

    // ---- Tick ----

    /// Run one scheduler pass: promote at most one queued request, then
    /// correct every active unit.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::default();

        if !self.queue.is_empty() {
            if self.ctx.capabilities().is_single_channel() {
                self.promote_on_origin(&mut report);
            } else if !self.channels_full() {
                self.promote_to_clone(&mut report);
            }
        }

        self.correct_active(&mut report);

        if !report.is_quiet() {
            trace!("Tick {}: {:?}", self.ticks, report);
        }
        report
    }

    fn promote_to_clone(&mut self, report: &mut TickReport) {
        let Some(request) = self.queue.pop() else {
            return;
        };
        let Some(origin) = self.units.get(&request.origin) else {
            warn!("Dropped queued {} for missing {}", request.pointer, request.origin);
            report.dropped += 1;
            return;
        };

        let clone = self.pool.acquire(&mut self.ctx, origin);
        if self.ctx.capabilities().volume_control {
            clone.set_volume(origin.volume());
        }
        clone.play(request.pointer, true);

        let id = clone.id();
        self.active.insert(id);
        report.promoted = Some(id);
        debug!("Promoted queued request of {} to {}", request.origin, id);
    }

    /// Single channel: the origin plays the request itself, cutting off what
    /// it was playing. An idle origin waits while another unit has the channel.
    fn promote_on_origin(&mut self, report: &mut TickReport) {
        let Some(origin) = self.queue.peek().map(|request| request.origin) else {
            return;
        };
        let full = self.channels_full();
        if self.units.get(&origin).is_some_and(|unit| full && unit.is_idle()) {
            return;
        }

        let Some(request) = self.queue.pop() else {
            return;
        };
        match self.units.get_mut(&request.origin) {
            Some(unit) => {
                unit.play(request.pointer, true);
                report.promoted = Some(request.origin);
            }
            None => {
                warn!("Dropped queued {} for missing {}", request.pointer, request.origin);
                report.dropped += 1;
            }
        }
    }

    fn correct_active(&mut self, report: &mut TickReport) {
        let ids: Vec<UnitId> = self.active.iter().copied().collect();
        for id in ids {
            let full = self.channels_full();
            let unit = match self.units.get_mut(&id) {
                Some(unit) => unit,
                None => match self.pool.get_mut(id) {
                    Some(unit) => unit,
                    None => {
                        self.active.remove(&id);
                        continue;
                    }
                },
            };

            // background music only comes back on a free channel
            if full && unit.is_idle() && unit.background().is_some() {
                continue;
            }

            match unit.correct() {
                Correction::Nothing => {}
                Correction::IdleClone => {
                    self.active.remove(&id);
                    report.deactivated.push(id);
                }
                correction => report.corrections.push((id, correction)),
            }
        }
    }

    /// Drive the engine: tick, sleep the configured interval, repeat until
    /// `done` returns true. The delay is measured from the end of each tick,
    /// so ticks never overlap and drift under load. Returns the ticks run.
    pub fn run_until<F>(&mut self, mut done: F) -> u64
    where
        F: FnMut(&Scheduler) -> bool,
    {
        let interval = self.config.tick_interval();
        let mut count = 0;
        loop {
            self.tick();
            count += 1;
            if done(self) {
                return count;
            }
            std::thread::sleep(interval);
        }
    }
}
