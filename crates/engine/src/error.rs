use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::model::UserId;

/// Result type used by the story engine crate.
pub type Result<T> = std::result::Result<T, StoryError>;

/// Errors produced by engine commands and model construction.
#[derive(Debug)]
pub enum StoryError {
    SessionNotOpen,
    SessionClosed,
    StoryNotFound {
        user: UserId,
    },
    EmptyStory {
        user: UserId,
    },
    DuplicateStory {
        user: UserId,
    },
    PageOutOfRange {
        page: usize,
        page_count: usize,
    },
    InvalidRational {
        num: i32,
        den: i32,
    },
    InvalidTap {
        x: f64,
        width: f64,
    },
    InvalidConfig {
        reason: String,
    },
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for StoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotOpen => write!(f, "player session is not open"),
            Self::SessionClosed => write!(f, "player session is closed"),
            Self::StoryNotFound { user } => write!(f, "story not found for user {user}"),
            Self::EmptyStory { user } => write!(f, "story of user {user} has no items"),
            Self::DuplicateStory { user } => {
                write!(f, "collection already holds a story for user {user}")
            }
            Self::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} is out of range (page count {page_count})")
            }
            Self::InvalidRational { num, den } => write!(f, "invalid rational {num}/{den}"),
            Self::InvalidTap { x, width } => {
                write!(f, "invalid tap at x={x} on surface width {width}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid session config: {reason}"),
            Self::ConfigIo { path, source } => {
                write!(f, "failed to read config: {} ({source})", path.display())
            }
            Self::ConfigParse { path, source } => {
                write!(f, "failed to parse config at {} ({source})", path.display())
            }
        }
    }
}

impl std::error::Error for StoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigIo { source, .. } => Some(source),
            Self::ConfigParse { source, .. } => Some(source),
            _ => None,
        }
    }
}
