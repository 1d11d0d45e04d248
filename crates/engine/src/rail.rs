use std::sync::mpsc::Receiver;

use tracing::debug;

use crate::model::StoryCollection;
use crate::read_state::StoryRead;

/// Avatar rail state: marks a story read once and tells which cell to redraw.
#[derive(Debug, Clone, Default)]
pub struct Rail {
    stories: StoryCollection,
}

impl Rail {
    pub fn new(stories: StoryCollection) -> Self {
        Self { stories }
    }

    pub fn stories(&self) -> &StoryCollection {
        &self.stories
    }

    /// Applies one read fact; returns the cell index to re-render, if any.
    pub fn apply(&mut self, read: &StoryRead) -> Option<usize> {
        let Some(index) = self.stories.position_of(&read.user) else {
            debug!(user = %read.user, "read fact for unknown story");
            return None;
        };
        let story = self.stories.get(index)?;
        if story.is_read() {
            return None;
        }
        let updated = story.with_read(true);
        self.stories.replace(index, updated);
        Some(index)
    }

    /// Applies every pending fact from `receiver` without blocking.
    pub fn drain(&mut self, receiver: &Receiver<StoryRead>) -> Vec<usize> {
        receiver
            .try_iter()
            .filter_map(|read| self.apply(&read))
            .collect()
    }
}
