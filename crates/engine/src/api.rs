use std::sync::mpsc::Receiver;

use serde::Serialize;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, StoryError};
use crate::gesture::TapZone;
use crate::model::{ItemId, StoryCollection, TapDirection, UserId};
use crate::orchestrator::PlaybackState;
use crate::read_state::{ReadStatePropagator, StoryRead};
use crate::renderer::{Epoch, Renderer};
use crate::session::PlayerSession;
use crate::time::MediaDuration;
use crate::track::TrackState;

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Opens the player on `user`'s story, closing any open session first.
    ///
    /// # Example
    /// ```ignore
    /// use story_engine::{Command, Engine, UserId};
    ///
    /// let mut engine = Engine::new(renderer, stories);
    /// let _ = engine.handle_command(Command::Open {
    ///     user: UserId::from("alice"),
    /// });
    /// ```
    Open {
        user: UserId,
    },
    /// Replaces the collection. The bound story keeps playing when its new
    /// item list extends the loaded one.
    ReplaceStories(StoryCollection),
    /// Duration callback from the renderer for an item it was asked to load.
    ///
    /// Stale epochs, non-current items and zero durations are ignored.
    ///
    /// # Example
    /// ```ignore
    /// use story_engine::{Command, Epoch, ItemId, MediaDuration};
    ///
    /// let _ = engine.handle_command(Command::DurationResolved {
    ///     epoch: Epoch(1),
    ///     item: ItemId::from("a"),
    ///     duration: MediaDuration::from_seconds(2.0),
    /// });
    /// ```
    DurationResolved {
        epoch: Epoch,
        item: ItemId,
        duration: MediaDuration,
    },
    /// Advances the animation clock by `elapsed_us` playback ticks.
    Tick {
        elapsed_us: i64,
    },
    Tap {
        zone: TapZone,
    },
    /// Tap at `x` on a surface `width` wide; mapped with the configured zones.
    TapAt {
        x: f64,
        width: f64,
    },
    ScrollStarted,
    /// The page at `page` came to rest in the centre of the pager.
    PageSettled {
        page: usize,
    },
    Dismiss,
}

/// Direction of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDirection {
    Next,
    Previous,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Dismissed,
    /// The last story of the collection was exhausted.
    Finished,
    /// The bound story disappeared from a refreshed collection.
    StoryRemoved,
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    SessionOpened {
        page: usize,
        user: UserId,
    },
    /// A new item became current; its indicator waits for the duration.
    ItemStarted {
        epoch: Epoch,
        page: usize,
        item_index: usize,
        item: ItemId,
    },
    TrackStarted {
        page: usize,
        item_index: usize,
        duration_us: i64,
    },
    TrackFinished {
        item_index: usize,
        cause: TapDirection,
    },
    TrackRestarted {
        item_index: usize,
    },
    /// The pager must scroll one page in `direction`.
    PageRequested {
        from: usize,
        to: usize,
        direction: NavigationDirection,
    },
    PagePaused {
        page: usize,
        seek_reset: bool,
    },
    PageResumed {
        page: usize,
    },
    StoryExtended {
        page: usize,
        appended: usize,
    },
    StoryRead {
        user: UserId,
    },
    Closed {
        reason: CloseReason,
    },
    Error(EngineErrorEvent),
}

/// User-facing error category emitted as an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    SessionUnavailable,
    StoryNotFound,
    InvalidInput,
    Config,
    Other,
}

impl From<&StoryError> for EngineErrorKind {
    fn from(value: &StoryError) -> Self {
        match value {
            StoryError::SessionNotOpen | StoryError::SessionClosed => Self::SessionUnavailable,
            StoryError::StoryNotFound { .. } => Self::StoryNotFound,
            StoryError::InvalidTap { .. } | StoryError::PageOutOfRange { .. } => {
                Self::InvalidInput
            }
            StoryError::InvalidConfig { .. }
            | StoryError::ConfigIo { .. }
            | StoryError::ConfigParse { .. } => Self::Config,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &StoryError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable view of the player session consumed by renderers and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub page: usize,
    pub epoch: Option<Epoch>,
    pub state: PlaybackState,
    pub tracks: Vec<TrackState>,
    /// Live queue, current item first.
    pub queued: Vec<ItemId>,
    pub playing: bool,
    /// A user scroll reset the seek position; settling resumes playback.
    pub should_resume: bool,
    pub will_advance: bool,
    pub closed: bool,
}

/// Story player engine: one player surface over a collection of stories.
#[derive(Debug)]
pub struct Engine<R> {
    pub(crate) renderer: R,
    pub(crate) stories: StoryCollection,
    pub(crate) config: SessionConfig,
    pub(crate) reads: ReadStatePropagator,
    pub(crate) session: Option<PlayerSession>,
    pub(crate) next_epoch: u64,
}

impl<R> Engine<R>
where
    R: Renderer,
{
    /// Creates an engine over `stories` with the default session config.
    pub fn new(renderer: R, stories: StoryCollection) -> Self {
        Self {
            renderer,
            stories,
            config: SessionConfig::default(),
            reads: ReadStatePropagator::new(),
            session: None,
            next_epoch: 1,
        }
    }

    /// Creates an engine with a validated session config.
    pub fn with_config(renderer: R, stories: StoryCollection, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(renderer, stories)
        })
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::Open { user } => self.open(user),
            Command::ReplaceStories(stories) => self.replace_stories(stories),
            Command::DurationResolved {
                epoch,
                item,
                duration,
            } => self.duration_resolved(epoch, &item, duration),
            Command::Tick { elapsed_us } => self.tick(elapsed_us),
            Command::Tap { zone } => self.tap(zone),
            Command::TapAt { x, width } => {
                let zone = TapZone::from_position(x, width, self.config.left_zone_fraction)?;
                self.tap(zone)
            }
            Command::ScrollStarted => self.scroll_started(),
            Command::PageSettled { page } => self.page_settled(page),
            Command::Dismiss => self.dismiss(),
        }
    }

    /// Registers a read-state subscriber, typically the avatar rail.
    pub fn subscribe_reads(&mut self) -> Receiver<StoryRead> {
        let rx = self.reads.subscribe();
        debug!(subscribers = self.reads.subscriber_count(), "read-state subscriber added");
        rx
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.session.as_ref().map(PlayerSession::snapshot)
    }

    pub fn stories(&self) -> &StoryCollection {
        &self.stories
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub(crate) fn allocate_epoch(&mut self) -> Epoch {
        let epoch = Epoch(self.next_epoch);
        self.next_epoch += 1;
        epoch
    }
}
