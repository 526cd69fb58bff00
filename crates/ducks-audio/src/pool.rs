use std::collections::BTreeMap;

use ducks_core::UnitId;
use tracing::debug;

use crate::context::EngineContext;
use crate::unit::PlaybackUnit;

/// Duplicates of registered units, kept around for reuse once they go idle.
///
/// Busy clones are never handed out again, so an origin ends up with as many
/// clones as it ever had overlapping queued plays.
#[derive(Default)]
pub struct ClonePool {
    clones: BTreeMap<UnitId, PlaybackUnit>,
}

impl ClonePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle clone of `origin`, creating one if none is free.
    pub fn acquire<'a>(
        &'a mut self,
        ctx: &mut EngineContext,
        origin: &PlaybackUnit,
    ) -> &'a mut PlaybackUnit {
        let reusable = self
            .clones
            .values()
            .find(|clone| clone.origin() == Some(origin.id()) && clone.is_idle())
            .map(PlaybackUnit::id);

        let clone = match reusable {
            Some(id) => {
                debug!("Reusing clone {} of {}", id, origin.id());
                self.clones.remove(&id)
            }
            None => None,
        }
        .unwrap_or_else(|| PlaybackUnit::clone_of(ctx, origin));

        self.clones.entry(clone.id()).or_insert(clone)
    }

    pub fn get(&self, id: UnitId) -> Option<&PlaybackUnit> {
        self.clones.get(&id)
    }

    pub fn get_mut(&mut self, id: UnitId) -> Option<&mut PlaybackUnit> {
        self.clones.get_mut(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.clones.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PlaybackUnit> {
        self.clones.values()
    }

    /// Ids of every clone of `origin`.
    pub fn clones_of(&self, origin: UnitId) -> Vec<UnitId> {
        self.clones
            .values()
            .filter(|clone| clone.origin() == Some(origin))
            .map(PlaybackUnit::id)
            .collect()
    }

    /// Halt and drop every clone of `origin`, returning their ids.
    pub fn remove_origin(&mut self, origin: UnitId) -> Vec<UnitId> {
        let ids = self.clones_of(origin);
        for id in &ids {
            if let Some(mut clone) = self.clones.remove(id) {
                clone.halt();
            }
        }
        ids
    }
}
