use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};
use crate::gesture::DEFAULT_LEFT_ZONE_FRACTION;
use crate::playlist::DEFAULT_QUEUE_DEPTH;

/// Default animation clock granularity for headless drivers (60 Hz).
pub const DEFAULT_FRAME_US: i64 = 16_667;

/// Item to land on when navigation moves back into the previous story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewindLanding {
    FirstItem,
    #[default]
    LastItem,
}

/// Tunables for a player session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Live queue depth, counting the current item.
    pub queue_depth: usize,
    /// Share of the surface width, from the left, mapped to rewind.
    pub left_zone_fraction: f64,
    pub rewind_landing: RewindLanding,
    /// Tick length used by drivers that simulate the animation clock.
    pub frame_us: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_depth: DEFAULT_QUEUE_DEPTH,
            left_zone_fraction: DEFAULT_LEFT_ZONE_FRACTION,
            rewind_landing: RewindLanding::default(),
            frame_us: DEFAULT_FRAME_US,
        }
    }
}

impl SessionConfig {
    /// Loads and validates a JSON config file; absent fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| StoryError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| StoryError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_depth < 2 {
            return Err(StoryError::InvalidConfig {
                reason: format!("queue_depth must be at least 2, got {}", self.queue_depth),
            });
        }
        if !(self.left_zone_fraction > 0.0 && self.left_zone_fraction < 1.0) {
            return Err(StoryError::InvalidConfig {
                reason: format!(
                    "left_zone_fraction must be inside (0, 1), got {}",
                    self.left_zone_fraction
                ),
            });
        }
        if self.frame_us <= 0 {
            return Err(StoryError::InvalidConfig {
                reason: format!("frame_us must be positive, got {}", self.frame_us),
            });
        }
        Ok(())
    }
}
