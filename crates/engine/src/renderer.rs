use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::MediaItem;

/// Generation tag of one story binding on the player surface.
///
/// Every bind gets a fresh epoch; callbacks carrying an older one are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Display for Epoch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Media surface driven by the engine.
///
/// Calls are fire-and-forget. After [`Renderer::load`] the renderer reports
/// the item's duration asynchronously through
/// [`Command::DurationResolved`](crate::Command::DurationResolved), tagged with
/// the epoch it was given; it may report zero before settling.
pub trait Renderer {
    /// Makes `item` the current media and starts observing its duration.
    fn load(&mut self, epoch: Epoch, item: &MediaItem);

    /// Buffers an upcoming item of the live queue.
    fn preload(&mut self, epoch: Epoch, item: &MediaItem);

    fn play(&mut self);

    fn pause(&mut self);

    /// Seeks the current item to `at_us` playback ticks.
    fn seek(&mut self, at_us: i64);

    /// Drops every queued item and duration observer registered for `epoch`.
    fn release(&mut self, epoch: Epoch);
}
