use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};

/// CMTime-like rational number used as a media time base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Playback clock time base: microseconds.
    pub const MICROS: Self = Self {
        num: 1,
        den: 1_000_000,
    };

    /// Whole seconds.
    pub const SECONDS: Self = Self { num: 1, den: 1 };

    /// Creates a validated rational.
    ///
    /// # Example
    /// ```
    /// use story_engine::Rational;
    ///
    /// let tb = Rational::new(1, 600).expect("valid");
    /// assert_eq!(tb.den, 600);
    /// ```
    pub fn new(num: i32, den: i32) -> Result<Self> {
        if num <= 0 || den <= 0 {
            return Err(StoryError::InvalidRational { num, den });
        }
        Ok(Self { num, den })
    }
}

/// Playback clock base `(1, 1_000_000)`; every engine duration is in these ticks.
pub const PLAYBACK_TIME_BASE: Rational = Rational::MICROS;

/// Rescales `ts` from one time base to another with nearest rounding.
///
/// # Example
/// ```
/// use story_engine::{PLAYBACK_TIME_BASE, Rational, rescale};
///
/// let src = Rational::new(1, 600).expect("valid");
/// assert_eq!(rescale(1_800, src, PLAYBACK_TIME_BASE), 3_000_000);
/// ```
pub fn rescale(ts: i64, from: Rational, to: Rational) -> i64 {
    let numerator = i128::from(ts) * i128::from(from.num) * i128::from(to.den);
    let denominator = i128::from(from.den) * i128::from(to.num);
    let rounded = div_round_nearest(numerator, denominator);
    rounded.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

fn div_round_nearest(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);

    let abs_num = num.abs();
    let mut out = abs_num / den;
    let remainder = abs_num % den;
    if remainder.saturating_mul(2) >= den {
        out += 1;
    }

    if num < 0 { -out } else { out }
}

/// Duration reported by the renderer, expressed as `value` ticks of `time_base`.
///
/// A zero value means "not known yet"; renderers may report it transiently
/// and then settle on the real length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDuration {
    pub value: i64,
    pub time_base: Rational,
}

impl MediaDuration {
    /// Duration that has not been resolved yet.
    pub const UNKNOWN: Self = Self {
        value: 0,
        time_base: Rational::SECONDS,
    };

    /// Builds a duration from fractional seconds, rounded to microseconds.
    pub fn from_seconds(seconds: f64) -> Self {
        let value = if seconds.is_finite() && seconds > 0.0 {
            (seconds * 1_000_000.0).round() as i64
        } else {
            0
        };
        Self {
            value,
            time_base: Rational::MICROS,
        }
    }

    /// Returns the duration in playback ticks; zero or negative when unknown.
    pub fn as_micros(&self) -> i64 {
        rescale(self.value, self.time_base, PLAYBACK_TIME_BASE)
    }

    pub fn is_known(&self) -> bool {
        self.as_micros() > 0
    }
}
