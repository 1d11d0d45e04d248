use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};

/// Fraction of the player surface, from the left edge, that rewinds.
pub const DEFAULT_LEFT_ZONE_FRACTION: f64 = 1.0 / 3.0;

/// Zone of the player surface that received a tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TapZone {
    Rewind,
    Skip,
}

impl TapZone {
    /// Maps a tap at `x` on a surface `width` wide to its zone.
    ///
    /// # Example
    /// ```
    /// use story_engine::TapZone;
    ///
    /// let zone = TapZone::from_position(10.0, 300.0, 1.0 / 3.0).expect("valid tap");
    /// assert_eq!(zone, TapZone::Rewind);
    /// ```
    pub fn from_position(x: f64, width: f64, left_fraction: f64) -> Result<Self> {
        if !width.is_finite() || width <= 0.0 || !x.is_finite() || x < 0.0 || x > width {
            return Err(StoryError::InvalidTap { x, width });
        }
        if x < width * left_fraction {
            Ok(Self::Rewind)
        } else {
            Ok(Self::Skip)
        }
    }
}
