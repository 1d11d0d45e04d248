use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};

/// Opaque identifier of one media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

/// Opaque identifier of a user; doubles as the identity of their story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Still image or video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    #[default]
    Video,
}

/// One playable unit of a story.
///
/// Equality compares identifier and locator, which is what the list-diffing
/// helper uses. Identity is the identifier alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: ItemId,
    pub locator: String,
    #[serde(default)]
    pub kind: MediaKind,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: ItemId(id.into()),
            locator: locator.into(),
            kind: MediaKind::default(),
        }
    }

    pub fn same_identity(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Owner of a story, shown as an avatar in the rail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub handle: String,
    #[serde(default)]
    pub avatar: String,
}

impl User {
    pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: UserId(id.into()),
            handle: handle.into(),
            avatar: String::new(),
        }
    }

    pub fn same_content(&self, other: &Self) -> bool {
        self.handle == other.handle && self.avatar == other.avatar
    }
}

/// One user's ordered, non-empty set of media items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoryRecord")]
pub struct Story {
    user: User,
    is_read: bool,
    items: Vec<MediaItem>,
}

#[derive(Deserialize)]
struct StoryRecord {
    user: User,
    #[serde(default)]
    is_read: bool,
    items: Vec<MediaItem>,
}

impl TryFrom<StoryRecord> for Story {
    type Error = StoryError;

    fn try_from(value: StoryRecord) -> Result<Self> {
        Self::new(value.user, value.is_read, value.items)
    }
}

impl Story {
    /// Builds a story; rejects an empty item list.
    pub fn new(user: User, is_read: bool, items: Vec<MediaItem>) -> Result<Self> {
        if items.is_empty() {
            return Err(StoryError::EmptyStory { user: user.id });
        }
        Ok(Self {
            user,
            is_read,
            items,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Returns a copy with the read flag replaced.
    pub fn with_read(&self, is_read: bool) -> Self {
        Self {
            is_read,
            ..self.clone()
        }
    }

    /// Two stories are the same story when they belong to the same user.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.user.id == other.user.id
    }

    /// Content changes are a new read flag or a different item sequence.
    pub fn same_content(&self, other: &Self) -> bool {
        self.is_read == other.is_read && self.items == other.items
    }
}

/// Ordered stories, one per user, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Story>", into = "Vec<Story>")]
pub struct StoryCollection {
    stories: Vec<Story>,
}

impl TryFrom<Vec<Story>> for StoryCollection {
    type Error = StoryError;

    fn try_from(value: Vec<Story>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<StoryCollection> for Vec<Story> {
    fn from(value: StoryCollection) -> Self {
        value.stories
    }
}

impl StoryCollection {
    /// Builds a collection; a user may own at most one story.
    pub fn new(stories: Vec<Story>) -> Result<Self> {
        for (index, story) in stories.iter().enumerate() {
            if stories[..index]
                .iter()
                .any(|earlier| earlier.same_identity(story))
            {
                return Err(StoryError::DuplicateStory {
                    user: story.user_id().clone(),
                });
            }
        }
        Ok(Self { stories })
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, page: usize) -> Option<&Story> {
        self.stories.get(page)
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    /// Finds the page of a user's story by identity.
    pub fn position_of(&self, user: &UserId) -> Option<usize> {
        self.stories.iter().position(|story| story.user_id() == user)
    }

    pub(crate) fn replace(&mut self, page: usize, story: Story) {
        if let Some(slot) = self.stories.get_mut(page) {
            *slot = story;
        }
    }
}

/// Position of the playing item; only defined while a session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackCursor {
    pub story_index: usize,
    pub item_index: usize,
}

/// Cause carried by a track-finished signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TapDirection {
    #[default]
    None,
    Skip,
    Rewind,
}
