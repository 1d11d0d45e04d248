use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::Serialize;
use tracing::{debug, info};

use crate::model::UserId;

/// Fact published when a story has been fully viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryRead {
    pub user: UserId,
}

/// Typed channel informing the rail which stories were read.
///
/// Each story is published at most once per player session; subscribers
/// whose receiving end was dropped are pruned on the next publication.
#[derive(Debug, Default)]
pub struct ReadStatePropagator {
    subscribers: Vec<Sender<StoryRead>>,
    published: HashSet<UserId>,
}

impl ReadStatePropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and returns its receiving end.
    pub fn subscribe(&mut self) -> Receiver<StoryRead> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publishes `user`'s story as read; returns false for a duplicate.
    pub fn publish(&mut self, user: &UserId) -> bool {
        if !self.published.insert(user.clone()) {
            debug!(%user, "duplicate story read suppressed");
            return false;
        }

        let fact = StoryRead { user: user.clone() };
        self.subscribers
            .retain(|subscriber| subscriber.send(fact.clone()).is_ok());
        info!(%user, subscribers = self.subscribers.len(), "story read published");
        true
    }

    /// Forgets publications; called when a new session opens.
    pub fn reset(&mut self) {
        self.published.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
