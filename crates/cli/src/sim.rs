use std::collections::{HashMap, VecDeque};

use story_engine::{Command, Epoch, ItemId, MediaDuration, MediaItem, Renderer};
use tracing::{debug, warn};

/// Headless renderer that answers loads with queued duration callbacks.
///
/// Callbacks are collected with [`SimulatedRenderer::take_pending`] and fed
/// back to the engine on the next driver turn, like a player that resolves
/// the asset asynchronously.
#[derive(Debug)]
pub struct SimulatedRenderer {
    durations: HashMap<ItemId, Option<f64>>,
    interim_zero: bool,
    pending: VecDeque<Command>,
}

impl SimulatedRenderer {
    pub fn new(durations: HashMap<ItemId, Option<f64>>, interim_zero: bool) -> Self {
        Self {
            durations,
            interim_zero,
            pending: VecDeque::new(),
        }
    }

    pub fn take_pending(&mut self) -> Vec<Command> {
        self.pending.drain(..).collect()
    }

    fn resolved(&mut self, epoch: Epoch, item: &ItemId, duration: MediaDuration) {
        self.pending.push_back(Command::DurationResolved {
            epoch,
            item: item.clone(),
            duration,
        });
    }
}

impl Renderer for SimulatedRenderer {
    fn load(&mut self, epoch: Epoch, item: &MediaItem) {
        let Some(Some(seconds)) = self.durations.get(&item.id).copied() else {
            warn!(%epoch, item = %item.id, locator = %item.locator, "media failed to load");
            return;
        };
        debug!(%epoch, item = %item.id, seconds, "media loading");
        if self.interim_zero {
            self.resolved(epoch, &item.id, MediaDuration::UNKNOWN);
        }
        self.resolved(epoch, &item.id, MediaDuration::from_seconds(seconds));
    }

    fn preload(&mut self, epoch: Epoch, item: &MediaItem) {
        debug!(%epoch, item = %item.id, "media preloaded");
    }

    fn play(&mut self) {
        debug!("media playing");
    }

    fn pause(&mut self) {
        debug!("media paused");
    }

    fn seek(&mut self, at_us: i64) {
        debug!(at_us, "media seek");
    }

    fn release(&mut self, epoch: Epoch) {
        debug!(%epoch, "media released");
    }
}
