//! Ducks Audio - sprite-based sound playback with channel pooling
//!
//! One audio file holds many short clips ("sprites"). A [`Scheduler`] owns the
//! playback units built from such files, hands overlapping requests to pooled
//! clones while channels are free, and on single-channel platforms keeps a
//! background track going between foreground effects.

pub mod backend;
pub mod capability;
mod config;
mod context;
mod error;
pub mod host;
mod pool;
mod queue;
pub mod resource;
mod scheduler;
mod sprite;
mod unit;

pub use capability::{BackendKind, EngineCapabilities};
pub use config::{Autoplay, EngineConfig, UnitSettings};
pub use context::EngineContext;
pub use error::{AudioError, SeekError};
pub use pool::ClonePool;
pub use queue::{PlayRequest, RequestQueue};
pub use resource::Resource;
pub use scheduler::{Scheduler, TickReport};
pub use sprite::{Pointer, SpriteEntry, Spritemap, STREAM_SPRITE};
pub use unit::{BackgroundMusic, Correction, PlayOutcome, PlaybackUnit, UnitState};

pub use ducks_core::{Clock, ManualClock, SystemClock, UnitId};
