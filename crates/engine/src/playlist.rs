use std::collections::VecDeque;

use tracing::debug;

use crate::diff::{common_prefix_len, insertion_indices};
use crate::model::MediaItem;

/// Default live queue depth: the current item plus one pre-buffered item.
pub const DEFAULT_QUEUE_DEPTH: usize = 2;

/// Result of [`Playlist::skip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The cursor moved forward to `index`.
    Advanced { index: usize },
    /// No item exists beyond the current one; the caller must request the next story.
    Exhausted,
    /// The traversal already reported exhaustion, or the playlist is empty.
    Drained,
}

/// Result of [`Playlist::rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewindOutcome {
    /// The cursor moved back to `index`.
    Rewound { index: usize },
    /// The cursor is at the first item (or the playlist is empty).
    AtStart,
}

/// Result of [`Playlist::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Contents were replaced and the cursor reset.
    Fresh { count: usize },
    /// The new sequence extended the loaded one; in-flight playback is kept.
    Extended { appended: usize },
    /// The current item kept its identity but its media changed; it must be
    /// reloaded at `index`.
    CurrentReplaced { index: usize },
    /// The new sequence equals the loaded one.
    Unchanged,
}

/// Renderer seek produced by [`Playlist::reset_to_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub item_index: usize,
    pub at_us: i64,
}

/// Ordered items of the bound story plus the live queue handed to the renderer.
///
/// The queue front is always the current item. Items behind the front are the
/// pre-buffered lookahead; newly queued ones are reported by
/// [`Playlist::take_enqueued`] so they can be preloaded.
#[derive(Debug, Clone)]
pub struct Playlist {
    items: Vec<MediaItem>,
    queue: VecDeque<usize>,
    cursor: usize,
    drained: bool,
    queue_depth: usize,
    enqueued: Vec<usize>,
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_DEPTH)
    }
}

impl Playlist {
    /// Creates an empty playlist. `queue_depth` is clamped to at least 2.
    pub fn new(queue_depth: usize) -> Self {
        Self {
            items: Vec::new(),
            queue: VecDeque::new(),
            cursor: 0,
            drained: false,
            queue_depth: queue_depth.max(2),
            enqueued: Vec::new(),
        }
    }

    /// Replaces the contents, keeping in-flight playback when `items` extends
    /// what is already loaded.
    ///
    /// # Example
    /// ```
    /// use story_engine::MediaItem;
    /// use story_engine::playlist::{LoadOutcome, Playlist, SkipOutcome};
    ///
    /// let a = MediaItem::new("a", "file:///a.mp4");
    /// let b = MediaItem::new("b", "file:///b.mp4");
    /// let mut playlist = Playlist::default();
    /// playlist.load(vec![a.clone()]);
    /// assert_eq!(playlist.load(vec![a, b]), LoadOutcome::Extended { appended: 1 });
    /// assert_eq!(playlist.skip(), SkipOutcome::Advanced { index: 1 });
    /// ```
    pub fn load(&mut self, items: Vec<MediaItem>) -> LoadOutcome {
        if self.items.is_empty() {
            return self.load_fresh(items);
        }

        let prefix = common_prefix_len(&self.items, &items);
        let is_superset = prefix == self.items.len() && items.len() >= self.items.len();
        if !is_superset {
            debug!(
                prefix,
                old_len = self.items.len(),
                new_len = items.len(),
                "playlist reload without shared prefix"
            );
            return self.load_fresh(items);
        }

        let Some(&first_insert) = insertion_indices(&self.items, &items).first() else {
            return LoadOutcome::Unchanged;
        };
        let appended = items.len() - self.items.len();
        let current_replaced = self.items.get(self.cursor) != items.get(self.cursor);
        self.items = items;

        if current_replaced {
            self.queue.clear();
            self.enqueued.clear();
            self.drained = false;
            self.top_up();
            debug!(cursor = self.cursor, "current item replaced in place");
            return LoadOutcome::CurrentReplaced { index: self.cursor };
        }

        // Queued entries at or past the first changed index now refer to new items.
        let stale: Vec<usize> = self
            .queue
            .iter()
            .skip(1)
            .copied()
            .filter(|index| *index >= first_insert)
            .collect();
        self.enqueued.extend(stale);
        if appended > 0 {
            self.drained = false;
        }
        self.top_up();

        debug!(first_insert, appended, "playlist extended in place");
        LoadOutcome::Extended { appended }
    }

    fn load_fresh(&mut self, items: Vec<MediaItem>) -> LoadOutcome {
        self.clear();
        let count = items.len();
        self.items = items;
        self.top_up();
        LoadOutcome::Fresh { count }
    }

    /// Advances the cursor by one item, forward only.
    pub fn skip(&mut self) -> SkipOutcome {
        if self.items.is_empty() || self.drained {
            return SkipOutcome::Drained;
        }
        if self.cursor + 1 >= self.items.len() {
            self.drained = true;
            return SkipOutcome::Exhausted;
        }

        let _ = self.queue.pop_front();
        self.cursor += 1;
        if self.queue.front() != Some(&self.cursor) {
            self.queue.clear();
            self.queue.push_back(self.cursor);
        }
        self.top_up();
        SkipOutcome::Advanced { index: self.cursor }
    }

    /// Moves the cursor back by one item; never below the first item.
    pub fn rewind(&mut self) -> RewindOutcome {
        if self.items.is_empty() || self.cursor == 0 {
            return RewindOutcome::AtStart;
        }

        self.drained = false;
        self.cursor -= 1;
        self.queue.push_front(self.cursor);
        self.queue.truncate(self.queue_depth);
        RewindOutcome::Rewound { index: self.cursor }
    }

    /// Positions the cursor at `index` (clamped to the last item).
    pub fn start_at(&mut self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        self.cursor = index.min(self.items.len() - 1);
        self.drained = false;
        self.queue.clear();
        self.enqueued.clear();
        self.top_up();
    }

    /// Seeks the current item back to zero; the cursor is unchanged.
    pub fn reset_to_start(&self) -> Option<SeekRequest> {
        self.current()?;
        Some(SeekRequest {
            item_index: self.cursor,
            at_us: 0,
        })
    }

    /// Empties the playlist and resets the cursor.
    pub fn clear(&mut self) {
        self.items.clear();
        self.queue.clear();
        self.enqueued.clear();
        self.cursor = 0;
        self.drained = false;
    }

    /// Drains items queued since the last call, for renderer preloading.
    pub fn take_enqueued(&mut self) -> Vec<MediaItem> {
        let mut indices = std::mem::take(&mut self.enqueued);
        indices.dedup();
        indices
            .into_iter()
            .filter(|index| *index != self.cursor)
            .filter_map(|index| self.items.get(index).cloned())
            .collect()
    }

    pub fn current(&self) -> Option<&MediaItem> {
        if self.items.is_empty() {
            return None;
        }
        self.items.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Items in the live queue, current first.
    pub fn queued(&self) -> Vec<&MediaItem> {
        self.queue
            .iter()
            .filter_map(|index| self.items.get(*index))
            .collect()
    }

    fn top_up(&mut self) {
        if self.items.is_empty() {
            return;
        }
        if self.queue.is_empty() {
            self.queue.push_back(self.cursor);
        }
        while self.queue.len() < self.queue_depth {
            let Some(&last) = self.queue.back() else {
                break;
            };
            let next = last + 1;
            if next >= self.items.len() {
                break;
            }
            self.queue.push_back(next);
            self.enqueued.push(next);
        }
    }
}
