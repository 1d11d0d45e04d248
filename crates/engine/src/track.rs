use serde::Serialize;
use tracing::debug;

use crate::model::TapDirection;

/// Visual state of one progress indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackState {
    pub progress: f64,
    pub running: bool,
}

/// Signal raised by the controller for the orchestrator to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSignal {
    Finished { index: usize, cause: TapDirection },
    /// Raised instead of `Finished` by a rewind on the edge page.
    Restarted { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveAnimation {
    index: usize,
    duration_us: i64,
    elapsed_us: i64,
    paused: bool,
}

/// One progress indicator per item of the bound story; at most one animates.
#[derive(Debug, Clone, Default)]
pub struct TrackController {
    tracks: Vec<TrackState>,
    current: usize,
    active: Option<ActiveAnimation>,
    restart_on_rewind: bool,
}

impl TrackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `track_count` indicators.
    ///
    /// Calling it again with the same count is a no-op. A different count
    /// keeps the fill of surviving indicators, so extending a bound story does
    /// not restart progress.
    pub fn configure(&mut self, track_count: usize) {
        if track_count == self.tracks.len() {
            return;
        }
        self.tracks.resize(track_count, TrackState::default());
        if self
            .active
            .is_some_and(|active| active.index >= track_count)
        {
            self.active = None;
        }
        if self.current >= track_count {
            self.current = track_count.saturating_sub(1);
        }
    }

    /// Flags the controller as bound to the edge page, where a rewind on the
    /// first indicator restarts it instead of finishing it.
    pub fn set_restart_on_rewind(&mut self, restart: bool) {
        self.restart_on_rewind = restart;
    }

    pub fn restart_on_rewind(&self) -> bool {
        self.restart_on_rewind
    }

    /// Makes `index` the current indicator with an empty fill, stopping any
    /// running animation. The fill starts once the duration is known.
    pub fn select(&mut self, index: usize) {
        if index >= self.tracks.len() {
            return;
        }
        self.stop_active();
        self.current = index;
        self.tracks[index] = TrackState::default();
    }

    /// Marks every indicator before `index` complete and the rest empty.
    pub fn fill_before(&mut self, index: usize) {
        for (position, track) in self.tracks.iter_mut().enumerate() {
            track.progress = if position < index { 1.0 } else { 0.0 };
            track.running = false;
        }
    }

    /// Starts a linear fill of `duration_us` for `track_index`.
    ///
    /// Returns false without starting anything for an unknown duration or an
    /// out-of-range index.
    pub fn animate_active(&mut self, duration_us: i64, track_index: usize) -> bool {
        if duration_us <= 0 || track_index >= self.tracks.len() {
            debug!(duration_us, track_index, "track animation not started");
            return false;
        }
        self.stop_active();
        self.current = track_index;
        self.tracks[track_index] = TrackState {
            progress: 0.0,
            running: true,
        };
        self.active = Some(ActiveAnimation {
            index: track_index,
            duration_us,
            elapsed_us: 0,
            paused: false,
        });
        true
    }

    /// Advances the running animation; reports a natural completion once.
    pub fn advance(&mut self, elapsed_us: i64) -> Option<TrackSignal> {
        let active = self.active.as_mut()?;
        if active.paused || elapsed_us <= 0 {
            return None;
        }

        active.elapsed_us = active.elapsed_us.saturating_add(elapsed_us);
        let index = active.index;
        if active.elapsed_us >= active.duration_us {
            self.active = None;
            self.tracks[index] = TrackState {
                progress: 1.0,
                running: false,
            };
            return Some(TrackSignal::Finished {
                index,
                cause: TapDirection::None,
            });
        }

        self.tracks[index].progress = active.elapsed_us as f64 / active.duration_us as f64;
        None
    }

    /// Suspends the active indicator, keeping its fill.
    pub fn pause(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.paused = true;
        self.tracks[active.index].running = false;
    }

    /// Continues the active indicator from its paused fill.
    pub fn resume(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.paused = false;
        self.tracks[active.index].running = true;
    }

    /// Fills `track_index` and raises `Finished` with cause `Skip`.
    pub fn complete_instantly(&mut self, track_index: usize) -> Option<TrackSignal> {
        if self.active_index() != Some(track_index) {
            debug!(track_index, "complete ignored: indicator is not active");
            return None;
        }
        self.active = None;
        self.tracks[track_index] = TrackState {
            progress: 1.0,
            running: false,
        };
        Some(TrackSignal::Finished {
            index: track_index,
            cause: TapDirection::Skip,
        })
    }

    /// Empties `track_index` and raises `Finished` with cause `Rewind`, or
    /// `Restarted` for the first indicator of the edge page.
    pub fn reset_instantly(&mut self, track_index: usize) -> Option<TrackSignal> {
        if self.active_index() != Some(track_index) {
            debug!(track_index, "reset ignored: indicator is not active");
            return None;
        }

        if self.restart_on_rewind && track_index == 0 {
            if let Some(active) = self.active.as_mut() {
                active.elapsed_us = 0;
            }
            self.tracks[track_index].progress = 0.0;
            return Some(TrackSignal::Restarted { index: track_index });
        }

        self.active = None;
        self.tracks[track_index] = TrackState::default();
        Some(TrackSignal::Finished {
            index: track_index,
            cause: TapDirection::Rewind,
        })
    }

    /// Removes every indicator and resets the current-track counter.
    pub fn cleanup_all(&mut self) {
        self.tracks.clear();
        self.current = 0;
        self.active = None;
        self.restart_on_rewind = false;
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.map(|active| active.index)
    }

    pub fn is_paused(&self) -> bool {
        self.active.is_some_and(|active| active.paused)
    }

    pub fn progress(&self, index: usize) -> Option<f64> {
        self.tracks.get(index).map(|track| track.progress)
    }

    pub fn snapshot(&self) -> Vec<TrackState> {
        self.tracks.clone()
    }

    fn stop_active(&mut self) {
        if let Some(active) = self.active.take() {
            self.tracks[active.index].running = false;
        }
    }
}
