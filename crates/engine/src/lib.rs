//! UI-agnostic playback engine for an Instagram-style stories player.

pub mod api;
pub mod config;
pub mod diff;
pub mod error;
pub mod gesture;
pub mod model;
pub mod orchestrator;
pub mod playlist;
pub mod rail;
pub mod read_state;
pub mod renderer;
mod session;
pub mod time;
pub mod track;

pub use api::{
    CloseReason, Command, Engine, EngineErrorEvent, EngineErrorKind, Event, NavigationDirection,
    SessionSnapshot,
};
pub use config::{RewindLanding, SessionConfig};
pub use error::{Result, StoryError};
pub use gesture::TapZone;
pub use model::{
    ItemId, MediaItem, MediaKind, PlaybackCursor, Story, StoryCollection, TapDirection, User,
    UserId,
};
pub use orchestrator::PlaybackState;
pub use rail::Rail;
pub use read_state::{ReadStatePropagator, StoryRead};
pub use renderer::{Epoch, Renderer};
pub use time::{MediaDuration, PLAYBACK_TIME_BASE, Rational, rescale};
pub use track::TrackState;
