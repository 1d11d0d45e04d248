//! Mediates between the playlist and the progress track controller.
//!
//! The orchestrator owns no media or visual state. Every input (a track
//! signal, a tap, a resolved duration) is interpreted against the bound
//! [`Playlist`] and [`TrackController`] and reported back as a
//! [`Transition`] for the page coordinator to act on.

use serde::Serialize;
use tracing::debug;

use crate::model::{PlaybackCursor, TapDirection};
use crate::playlist::{Playlist, RewindOutcome, SkipOutcome};
use crate::track::{TrackController, TrackSignal};

/// State of one bound player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    PlayingItem(PlaybackCursor),
    AwaitingNextStory,
    AwaitingPreviousStory,
    Closed,
}

/// What the page coordinator must do after the orchestrator handled an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    /// Load the item at `item_index` from its start; its indicator is selected
    /// and waits for the duration.
    PlayItem { item_index: usize },
    /// Seek the current item back to zero; its indicator already restarted.
    RestartItem { item_index: usize },
    RequestNextStory,
    RequestPreviousStory,
}

/// Result of one orchestrated step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub signal: Option<TrackSignal>,
    pub transition: Transition,
}

impl Step {
    const IGNORED: Self = Self {
        signal: None,
        transition: Transition::Stay,
    };
}

/// Playlist outcome of a tap, applied before the indicator is forced to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Skip(SkipOutcome),
    Rewind(RewindOutcome),
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    state: PlaybackState,
    in_flight: Option<InFlight>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            in_flight: None,
        }
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> Option<PlaybackCursor> {
        match self.state {
            PlaybackState::PlayingItem(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn is_playing_item(&self) -> bool {
        matches!(self.state, PlaybackState::PlayingItem(_))
    }

    /// `Idle -> PlayingItem`, seeded with the opened story and landing item.
    pub fn open(&mut self, story_index: usize, item_index: usize) {
        if self.state == PlaybackState::Closed {
            return;
        }
        self.in_flight = None;
        self.state = PlaybackState::PlayingItem(PlaybackCursor {
            story_index,
            item_index,
        });
    }

    /// Follows the bound story to a new page index after a collection refresh.
    pub fn relocate(&mut self, story_index: usize) {
        if let PlaybackState::PlayingItem(cursor) = &mut self.state {
            cursor.story_index = story_index;
        }
    }

    /// Starts the current indicator once its duration is known.
    ///
    /// Returns true when the animation started.
    pub fn on_duration(
        &mut self,
        duration_us: i64,
        playlist: &Playlist,
        tracks: &mut TrackController,
    ) -> bool {
        let Some(cursor) = self.cursor() else {
            return false;
        };
        if tracks.active_index().is_some() {
            return false;
        }
        debug_assert_eq!(cursor.item_index, playlist.cursor());
        tracks.animate_active(duration_us, playlist.cursor())
    }

    /// Right-zone tap: the cursor moves first, then the indicator completes.
    pub fn tap_skip(&mut self, playlist: &mut Playlist, tracks: &mut TrackController) -> Step {
        let Some(active) = self.tappable(tracks) else {
            return Step::IGNORED;
        };
        self.in_flight = Some(InFlight::Skip(playlist.skip()));
        match tracks.complete_instantly(active) {
            Some(signal) => self.on_signal(signal, playlist, tracks),
            None => {
                self.in_flight = None;
                Step::IGNORED
            }
        }
    }

    /// Left-zone tap: the cursor moves back first, then the indicator resets.
    pub fn tap_rewind(&mut self, playlist: &mut Playlist, tracks: &mut TrackController) -> Step {
        let Some(active) = self.tappable(tracks) else {
            return Step::IGNORED;
        };
        let outcome = playlist.rewind();
        if outcome == RewindOutcome::AtStart && tracks.restart_on_rewind() {
            return match tracks.reset_instantly(active) {
                Some(signal) => self.on_signal(signal, playlist, tracks),
                None => Step::IGNORED,
            };
        }
        self.in_flight = Some(InFlight::Rewind(outcome));
        match tracks.reset_instantly(active) {
            Some(signal) => self.on_signal(signal, playlist, tracks),
            None => {
                self.in_flight = None;
                Step::IGNORED
            }
        }
    }

    /// Interprets a signal raised by the track controller.
    pub fn on_signal(
        &mut self,
        signal: TrackSignal,
        playlist: &mut Playlist,
        tracks: &mut TrackController,
    ) -> Step {
        let Some(cursor) = self.cursor() else {
            debug!(?signal, state = ?self.state, "track signal outside playback ignored");
            return Step::IGNORED;
        };

        let transition = match signal {
            TrackSignal::Restarted { index } => Transition::RestartItem { item_index: index },
            TrackSignal::Finished { cause, .. } => match (cause, self.in_flight.take()) {
                (TapDirection::Skip, Some(InFlight::Skip(outcome))) => {
                    self.after_skip(outcome, cursor, tracks)
                }
                (TapDirection::Rewind, Some(InFlight::Rewind(outcome))) => {
                    self.after_rewind(outcome, cursor, tracks)
                }
                (TapDirection::Rewind, _) => {
                    let outcome = playlist.rewind();
                    self.after_rewind(outcome, cursor, tracks)
                }
                (TapDirection::None | TapDirection::Skip, _) => {
                    let outcome = playlist.skip();
                    self.after_skip(outcome, cursor, tracks)
                }
            },
        };

        Step {
            signal: Some(signal),
            transition,
        }
    }

    /// Enters the terminal state, stopping the indicators and flushing the queue.
    pub fn close(&mut self, playlist: &mut Playlist, tracks: &mut TrackController) {
        tracks.cleanup_all();
        playlist.clear();
        self.in_flight = None;
        self.state = PlaybackState::Closed;
    }

    fn tappable(&self, tracks: &TrackController) -> Option<usize> {
        if !self.is_playing_item() {
            debug!(state = ?self.state, "tap ignored outside playback");
            return None;
        }
        let active = tracks.active_index();
        if active.is_none() {
            debug!("tap ignored: no active indicator");
        }
        active
    }

    fn after_skip(
        &mut self,
        outcome: SkipOutcome,
        cursor: PlaybackCursor,
        tracks: &mut TrackController,
    ) -> Transition {
        match outcome {
            SkipOutcome::Advanced { index } => {
                tracks.select(index);
                self.state = PlaybackState::PlayingItem(PlaybackCursor {
                    item_index: index,
                    ..cursor
                });
                Transition::PlayItem { item_index: index }
            }
            SkipOutcome::Exhausted | SkipOutcome::Drained => {
                self.state = PlaybackState::AwaitingNextStory;
                Transition::RequestNextStory
            }
        }
    }

    fn after_rewind(
        &mut self,
        outcome: RewindOutcome,
        cursor: PlaybackCursor,
        tracks: &mut TrackController,
    ) -> Transition {
        match outcome {
            RewindOutcome::Rewound { index } => {
                tracks.select(index);
                self.state = PlaybackState::PlayingItem(PlaybackCursor {
                    item_index: index,
                    ..cursor
                });
                Transition::PlayItem { item_index: index }
            }
            RewindOutcome::AtStart => {
                self.state = PlaybackState::AwaitingPreviousStory;
                Transition::RequestPreviousStory
            }
        }
    }
}
