//! Page/scroll coordination for the single player surface.
//!
//! A session binds one story at a time to a [`PlayerSlot`]. Settling on
//! another page unbinds the slot (its epoch becomes stale) and binds the new
//! story; scrolling pauses the bound slot. Navigation requested by the
//! orchestrator is reported as [`Event::PageRequested`] and completes when the
//! pager settles on the requested page.

use tracing::{debug, info, warn};

use crate::api::{CloseReason, Engine, Event, NavigationDirection, SessionSnapshot};
use crate::config::RewindLanding;
use crate::error::{Result, StoryError};
use crate::gesture::TapZone;
use crate::model::{ItemId, StoryCollection, UserId};
use crate::orchestrator::{Orchestrator, PlaybackState, Step, Transition};
use crate::playlist::{LoadOutcome, Playlist};
use crate::renderer::{Epoch, Renderer};
use crate::time::MediaDuration;
use crate::track::{TrackController, TrackSignal};

/// One story bound to the player surface. Dropped on unbind.
#[derive(Debug)]
pub(crate) struct PlayerSlot {
    epoch: Epoch,
    page: usize,
    user: UserId,
    playlist: Playlist,
    tracks: TrackController,
    orchestrator: Orchestrator,
    playing: bool,
    should_resume: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPage {
    page: usize,
    direction: NavigationDirection,
    landing: RewindLanding,
}

#[derive(Debug)]
pub(crate) struct PlayerSession {
    page: usize,
    slot: Option<PlayerSlot>,
    will_advance: bool,
    pending: Option<PendingPage>,
    closed: bool,
}

impl PlayerSession {
    fn new(page: usize) -> Self {
        Self {
            page,
            slot: None,
            will_advance: false,
            pending: None,
            closed: false,
        }
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        let slot = self.slot.as_ref();
        SessionSnapshot {
            page: self.page,
            epoch: slot.map(|slot| slot.epoch),
            state: slot.map_or(PlaybackState::Idle, |slot| slot.orchestrator.state()),
            tracks: slot.map(|slot| slot.tracks.snapshot()).unwrap_or_default(),
            queued: slot
                .map(|slot| {
                    slot.playlist
                        .queued()
                        .into_iter()
                        .map(|item| item.id.clone())
                        .collect()
                })
                .unwrap_or_default(),
            playing: slot.is_some_and(|slot| slot.playing),
            should_resume: slot.is_some_and(|slot| slot.should_resume),
            will_advance: self.will_advance,
            closed: self.closed,
        }
    }
}

impl<R> Engine<R>
where
    R: Renderer,
{
    pub(crate) fn open(&mut self, user: UserId) -> Result<Vec<Event>> {
        let page = self
            .stories
            .position_of(&user)
            .ok_or_else(|| StoryError::StoryNotFound { user: user.clone() })?;

        let mut events = self.close(CloseReason::Dismissed);
        self.reads.reset();
        self.session = Some(PlayerSession::new(page));
        info!(%user, page, "player session opened");
        events.push(Event::SessionOpened { page, user });
        events.extend(self.bind(page, 0)?);
        Ok(events)
    }

    pub(crate) fn tick(&mut self, elapsed_us: i64) -> Result<Vec<Event>> {
        let Some(slot) = self.live_slot_mut() else {
            return Ok(Vec::new());
        };
        let Some(signal) = slot.tracks.advance(elapsed_us) else {
            return Ok(Vec::new());
        };
        let step = slot
            .orchestrator
            .on_signal(signal, &mut slot.playlist, &mut slot.tracks);
        self.apply_step(step)
    }

    pub(crate) fn duration_resolved(
        &mut self,
        epoch: Epoch,
        item: &ItemId,
        duration: MediaDuration,
    ) -> Result<Vec<Event>> {
        let Some(slot) = self.live_slot_mut() else {
            debug!(%epoch, %item, "duration callback without live slot");
            return Ok(Vec::new());
        };
        if slot.epoch != epoch {
            debug!(%epoch, current = %slot.epoch, %item, "stale duration callback ignored");
            return Ok(Vec::new());
        }
        if slot.playlist.current().map(|current| &current.id) != Some(item) {
            debug!(%epoch, %item, "duration for non-current item ignored");
            return Ok(Vec::new());
        }
        let duration_us = duration.as_micros();
        if duration_us <= 0 {
            debug!(%epoch, %item, "duration not known yet");
            return Ok(Vec::new());
        }

        let item_index = slot.playlist.cursor();
        if !slot
            .orchestrator
            .on_duration(duration_us, &slot.playlist, &mut slot.tracks)
        {
            return Ok(Vec::new());
        }
        if !slot.playing {
            slot.tracks.pause();
        }
        Ok(vec![Event::TrackStarted {
            page: slot.page,
            item_index,
            duration_us,
        }])
    }

    pub(crate) fn tap(&mut self, zone: TapZone) -> Result<Vec<Event>> {
        self.ensure_open()?;
        let Some(slot) = self.live_slot_mut() else {
            return Ok(Vec::new());
        };
        let step = match zone {
            TapZone::Skip => slot
                .orchestrator
                .tap_skip(&mut slot.playlist, &mut slot.tracks),
            TapZone::Rewind => slot
                .orchestrator
                .tap_rewind(&mut slot.playlist, &mut slot.tracks),
        };
        self.apply_step(step)
    }

    pub(crate) fn scroll_started(&mut self) -> Result<Vec<Event>> {
        self.ensure_open()?;
        let Some(session) = self.session.as_mut() else {
            return Ok(Vec::new());
        };
        let seek_reset = !session.will_advance;
        let Some(slot) = session.slot.as_mut() else {
            return Ok(Vec::new());
        };
        if !slot.playing {
            return Ok(Vec::new());
        }

        slot.tracks.pause();
        slot.playing = false;
        self.renderer.pause();
        if seek_reset {
            if let Some(seek) = slot.playlist.reset_to_start() {
                self.renderer.seek(seek.at_us);
            }
            slot.should_resume = true;
        }
        debug!(page = slot.page, seek_reset, "page paused for scroll");
        Ok(vec![Event::PagePaused {
            page: slot.page,
            seek_reset,
        }])
    }

    pub(crate) fn page_settled(&mut self, page: usize) -> Result<Vec<Event>> {
        let page_count = self.stories.len();
        if page >= page_count {
            return Err(StoryError::PageOutOfRange { page, page_count });
        }
        self.ensure_open()?;
        let Some(session) = self.session.as_mut() else {
            return Ok(Vec::new());
        };
        session.will_advance = false;
        let pending = session.pending.take();

        // A slot that already left its items (exhausted, or rewound past the
        // start) has nothing to resume and is bound again at its cursor.
        let rebind_at = match session.slot.as_mut().filter(|slot| slot.page == page) {
            None => None,
            Some(slot) if slot.orchestrator.is_playing_item() => {
                if slot.playing {
                    return Ok(Vec::new());
                }
                slot.tracks.resume();
                slot.playing = true;
                slot.should_resume = false;
                self.renderer.play();
                debug!(page, "page resumed");
                return Ok(vec![Event::PageResumed { page }]);
            }
            Some(slot) => Some(slot.playlist.cursor()),
        };
        if let Some(item_index) = rebind_at {
            info!(page, item_index, "settled back on page awaiting navigation");
            self.unbind();
            return self.bind(page, item_index);
        }

        let landing = match pending {
            Some(pending) if pending.page == page => pending.landing,
            _ => RewindLanding::FirstItem,
        };
        let item_index = match landing {
            RewindLanding::FirstItem => 0,
            RewindLanding::LastItem => self
                .stories
                .get(page)
                .map_or(0, |story| story.items().len().saturating_sub(1)),
        };
        self.unbind();
        self.bind(page, item_index)
    }

    pub(crate) fn replace_stories(&mut self, stories: StoryCollection) -> Result<Vec<Event>> {
        self.stories = stories;
        let Some(user) = self.live_slot_mut().map(|slot| slot.user.clone()) else {
            return Ok(Vec::new());
        };
        let Some(page) = self.stories.position_of(&user) else {
            info!(%user, "bound story removed from collection");
            return Ok(self.close(CloseReason::StoryRemoved));
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(Vec::new());
        };
        let Some(slot) = session.slot.as_mut() else {
            return Ok(Vec::new());
        };
        let Some(items) = self.stories.get(page).map(|story| story.items().to_vec()) else {
            return Ok(Vec::new());
        };
        let item_count = items.len();

        session.page = page;
        slot.page = page;
        slot.orchestrator.relocate(page);
        slot.tracks.set_restart_on_rewind(page == 0);
        if let Some(pending) = session.pending.as_mut() {
            pending.page = match pending.direction {
                NavigationDirection::Next => page + 1,
                NavigationDirection::Previous => page.saturating_sub(1),
            };
        }

        match slot.playlist.load(items) {
            LoadOutcome::Unchanged => Ok(Vec::new()),
            LoadOutcome::Extended { appended } => {
                slot.tracks.configure(item_count);
                for item in slot.playlist.take_enqueued() {
                    self.renderer.preload(slot.epoch, &item);
                }
                if appended == 0 {
                    debug!(%user, page, "queued media refreshed");
                    return Ok(Vec::new());
                }
                info!(%user, page, appended, "bound story extended");
                Ok(vec![Event::StoryExtended { page, appended }])
            }
            LoadOutcome::CurrentReplaced { index } => {
                info!(%user, page, index, "current item media replaced, rebinding");
                self.unbind();
                self.bind(page, index)
            }
            LoadOutcome::Fresh { count } => {
                info!(%user, page, count, "bound story diverged, rebinding");
                self.unbind();
                self.bind(page, 0)
            }
        }
    }

    pub(crate) fn dismiss(&mut self) -> Result<Vec<Event>> {
        self.ensure_open()?;
        Ok(self.close(CloseReason::Dismissed))
    }

    fn bind(&mut self, page: usize, item_index: usize) -> Result<Vec<Event>> {
        let page_count = self.stories.len();
        let story = self
            .stories
            .get(page)
            .cloned()
            .ok_or(StoryError::PageOutOfRange { page, page_count })?;
        let epoch = self.allocate_epoch();

        let mut slot = PlayerSlot {
            epoch,
            page,
            user: story.user_id().clone(),
            playlist: Playlist::new(self.config.queue_depth),
            tracks: TrackController::new(),
            orchestrator: Orchestrator::new(),
            playing: true,
            should_resume: false,
        };
        slot.playlist.load(story.items().to_vec());
        slot.playlist.start_at(item_index);
        let item_index = slot.playlist.cursor();
        slot.tracks.configure(story.items().len());
        slot.tracks.set_restart_on_rewind(page == 0);
        slot.tracks.fill_before(item_index);
        slot.tracks.select(item_index);
        slot.orchestrator.open(page, item_index);

        let Some(item) = slot.playlist.current().cloned() else {
            warn!(page, "bound story has no playable item");
            return Ok(Vec::new());
        };
        self.renderer.load(epoch, &item);
        for next in slot.playlist.take_enqueued() {
            self.renderer.preload(epoch, &next);
        }
        self.renderer.play();
        info!(%epoch, page, item_index, user = %slot.user, "story bound to player");

        let Some(session) = self.session.as_mut() else {
            return Err(StoryError::SessionNotOpen);
        };
        session.page = page;
        session.slot = Some(slot);
        Ok(vec![Event::ItemStarted {
            epoch,
            page,
            item_index,
            item: item.id,
        }])
    }

    fn unbind(&mut self) {
        let Some(mut slot) = self.session.as_mut().and_then(|session| session.slot.take()) else {
            return;
        };
        slot.orchestrator.close(&mut slot.playlist, &mut slot.tracks);
        self.renderer.pause();
        self.renderer.release(slot.epoch);
        debug!(epoch = %slot.epoch, page = slot.page, "slot unbound");
    }

    fn apply_step(&mut self, step: Step) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        match step.signal {
            Some(TrackSignal::Finished { index, cause }) => events.push(Event::TrackFinished {
                item_index: index,
                cause,
            }),
            Some(TrackSignal::Restarted { index }) => {
                events.push(Event::TrackRestarted { item_index: index })
            }
            None => {}
        }

        match step.transition {
            Transition::Stay => {}
            Transition::PlayItem { item_index } => events.extend(self.play_item(item_index)),
            Transition::RestartItem { item_index } => {
                debug!(item_index, "edge page item restarted");
                if let Some(seek) = self
                    .live_slot_mut()
                    .and_then(|slot| slot.playlist.reset_to_start())
                {
                    self.renderer.seek(seek.at_us);
                }
            }
            Transition::RequestNextStory => {
                events.extend(self.request_page(NavigationDirection::Next))
            }
            Transition::RequestPreviousStory => {
                events.extend(self.request_page(NavigationDirection::Previous))
            }
        }
        Ok(events)
    }

    fn play_item(&mut self, item_index: usize) -> Option<Event> {
        let slot = self.session.as_mut()?.slot.as_mut()?;
        let item = slot.playlist.current().cloned()?;
        self.renderer.load(slot.epoch, &item);
        for next in slot.playlist.take_enqueued() {
            self.renderer.preload(slot.epoch, &next);
        }
        if slot.playing {
            self.renderer.play();
        }
        debug!(epoch = %slot.epoch, item_index, item = %item.id, "item started");
        Some(Event::ItemStarted {
            epoch: slot.epoch,
            page: slot.page,
            item_index,
            item: item.id,
        })
    }

    fn request_page(&mut self, direction: NavigationDirection) -> Vec<Event> {
        let page_count = self.stories.len();
        let landing = self.config.rewind_landing;
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let Some(slot) = session.slot.as_ref() else {
            return Vec::new();
        };
        let from = slot.page;
        let mut events = Vec::new();

        if direction == NavigationDirection::Next && self.reads.publish(&slot.user) {
            events.push(Event::StoryRead {
                user: slot.user.clone(),
            });
        }

        let target = match direction {
            NavigationDirection::Next => Some(from + 1).filter(|next| *next < page_count),
            NavigationDirection::Previous => from.checked_sub(1),
        };
        let Some(to) = target else {
            if direction == NavigationDirection::Next {
                info!(page = from, "last story exhausted");
                events.extend(self.close(CloseReason::Finished));
            } else {
                debug!(page = from, "no previous page to request");
            }
            return events;
        };

        session.will_advance = true;
        session.pending = Some(PendingPage {
            page: to,
            direction,
            landing: match direction {
                NavigationDirection::Next => RewindLanding::FirstItem,
                NavigationDirection::Previous => landing,
            },
        });
        info!(from, to, ?direction, "page requested");
        events.push(Event::PageRequested {
            from,
            to,
            direction,
        });
        events
    }

    fn close(&mut self, reason: CloseReason) -> Vec<Event> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.closed {
            return Vec::new();
        }
        session.closed = true;
        session.will_advance = false;
        session.pending = None;
        if let Some(slot) = session.slot.as_mut() {
            slot.orchestrator.close(&mut slot.playlist, &mut slot.tracks);
            slot.playing = false;
            self.renderer.pause();
            self.renderer.release(slot.epoch);
        }
        info!(?reason, page = session.page, "player session closed");
        vec![Event::Closed { reason }]
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.session {
            None => Err(StoryError::SessionNotOpen),
            Some(session) if session.closed => Err(StoryError::SessionClosed),
            Some(_) => Ok(()),
        }
    }

    fn live_slot_mut(&mut self) -> Option<&mut PlayerSlot> {
        self.session
            .as_mut()
            .filter(|session| !session.closed)?
            .slot
            .as_mut()
    }
}
