//! Duration text codec for time entries.
//!
//! People type durations as `H:MM` or `HH:MM` (hours 0-99, minutes 00-59).
//! Two-digit hours may not start with zero, so `8:30` is valid and `08:30`
//! is not. Internally a duration is a whole number of minutes.

use core::fmt;
use core::iter::Sum;

use serde::{Deserialize, Serialize};

/// Errors produced while reading a duration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// The text is not `H:MM` / `HH:MM`.
    #[error("invalid duration {0:?}, expected H:MM")]
    InvalidFormat(String),
    /// More minutes than `99:59` can express.
    #[error("duration of {minutes} minutes exceeds {max}", max = EntryDuration::MAX_MINUTES)]
    OutOfRange {
        /// The rejected value.
        minutes: u32,
    },
}

/// Length of a single time entry, in minutes.
///
/// Always within `0..=5999` so it can be written back as `H:MM` text and
/// read again without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EntryDuration(u32);

impl EntryDuration {
    /// Largest representable duration (`99:59`).
    pub const MAX_MINUTES: u32 = 99 * 60 + 59;

    /// Zero minutes.
    pub const ZERO: Self = Self(0);

    /// Build a duration from a minute count.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError::OutOfRange`] above [`Self::MAX_MINUTES`].
    pub const fn from_minutes(minutes: u32) -> Result<Self, DurationError> {
        if minutes > Self::MAX_MINUTES {
            return Err(DurationError::OutOfRange { minutes });
        }
        Ok(Self(minutes))
    }

    /// Total minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for EntryDuration {
    type Error = DurationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<EntryDuration> for u32 {
    fn from(duration: EntryDuration) -> Self {
        duration.0
    }
}

impl fmt::Display for EntryDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl core::str::FromStr for EntryDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
    }
}

/// Parse `H:MM` / `HH:MM` text into a duration.
///
/// ```
/// use tally_core::duration::parse_duration;
///
/// assert_eq!(parse_duration("7:45").unwrap().minutes(), 465);
/// assert!(parse_duration("7:5").is_err());
/// assert!(parse_duration("07:45").is_err());
/// ```
///
/// # Errors
///
/// Returns [`DurationError::InvalidFormat`] for anything that does not match
/// `^([0-9]|[1-9][0-9]):([0-5][0-9])$`.
pub fn parse_duration(text: &str) -> Result<EntryDuration, DurationError> {
    let invalid = || DurationError::InvalidFormat(text.to_owned());

    let (hours, minutes) = text.split_once(':').ok_or_else(invalid)?;
    let hours = match hours.as_bytes() {
        [h] => digit(*h),
        [b'0', _] => None,
        [tens, ones] => digit(*tens).zip(digit(*ones)).map(|(t, o)| t * 10 + o),
        _ => None,
    }
    .ok_or_else(invalid)?;
    let minutes = match minutes.as_bytes() {
        [tens @ b'0'..=b'5', ones] => digit(*tens).zip(digit(*ones)).map(|(t, o)| t * 10 + o),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Ok(EntryDuration(hours * 60 + minutes))
}

/// Render a duration as `H:MM`, the inverse of [`parse_duration`].
#[must_use]
pub fn format_duration(duration: EntryDuration) -> String {
    duration.to_string()
}

fn digit(byte: u8) -> Option<u32> {
    byte.is_ascii_digit().then(|| u32::from(byte - b'0'))
}

/// Sum of many entry durations.
///
/// Unlike [`EntryDuration`] a total may exceed 99 hours; it is a reporting
/// value and never fed back into the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TotalMinutes(u64);

impl TotalMinutes {
    /// Wrap a raw minute count.
    #[must_use]
    pub const fn new(minutes: u64) -> Self {
        Self(minutes)
    }

    /// Total minutes.
    #[must_use]
    pub const fn minutes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TotalMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Sum<EntryDuration> for TotalMinutes {
    fn sum<I: Iterator<Item = EntryDuration>>(iter: I) -> Self {
        Self(iter.map(|d| u64::from(d.minutes())).sum())
    }
}

impl<'a> Sum<&'a EntryDuration> for TotalMinutes {
    fn sum<I: Iterator<Item = &'a EntryDuration>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Add up entry durations; an empty input totals zero.
pub fn aggregate<I>(durations: I) -> TotalMinutes
where
    I: IntoIterator<Item = EntryDuration>,
{
    durations.into_iter().sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn minutes(m: u32) -> EntryDuration {
        EntryDuration::from_minutes(m).unwrap()
    }

    #[test]
    fn test_parse_accepts_spec_shapes() {
        assert_eq!(parse_duration("0:00").unwrap().minutes(), 0);
        assert_eq!(parse_duration("1:30").unwrap().minutes(), 90);
        assert_eq!(parse_duration("10:05").unwrap().minutes(), 605);
        assert_eq!(parse_duration("99:59").unwrap().minutes(), 5999);
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        for bad in [
            "", ":", "1", "130", "1:3", "2:5", "1:60", "25:61", "00:30", "01:00", "100:00",
            "-1:00", "1:-5", " 1:00", "1:00 ", "a:bc", "1:0a", "1::00", "１:00", "+1:00",
        ] {
            assert_eq!(
                parse_duration(bad),
                Err(DurationError::InvalidFormat(bad.to_owned())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_format_pads_minutes() {
        assert_eq!(format_duration(minutes(0)), "0:00");
        assert_eq!(format_duration(minutes(65)), "1:05");
        assert_eq!(format_duration(minutes(600)), "10:00");
    }

    #[test]
    fn test_round_trip_whole_range() {
        for m in 0..=EntryDuration::MAX_MINUTES {
            let text = format_duration(minutes(m));
            assert_eq!(parse_duration(&text).unwrap().minutes(), m, "{text}");
        }
    }

    #[test]
    fn test_from_minutes_bounds() {
        assert!(EntryDuration::from_minutes(EntryDuration::MAX_MINUTES).is_ok());
        assert_eq!(
            EntryDuration::from_minutes(6000),
            Err(DurationError::OutOfRange { minutes: 6000 })
        );
    }

    #[test]
    fn test_aggregate() {
        assert_eq!(aggregate([]), TotalMinutes::new(0));
        assert_eq!(aggregate([minutes(90), minutes(30)]).minutes(), 120);
    }

    #[test]
    fn test_aggregate_large_batches() {
        let total = aggregate(std::iter::repeat_n(minutes(EntryDuration::MAX_MINUTES), 1_000));
        assert_eq!(total.minutes(), 5_999_000);
        assert_eq!(total.to_string(), "99983:20");
    }

    #[test]
    fn test_serde_validates_range() {
        let d: EntryDuration = serde_json::from_str("480").unwrap();
        assert_eq!(d.minutes(), 480);
        assert!(serde_json::from_str::<EntryDuration>("6000").is_err());
        assert_eq!(serde_json::to_string(&d).unwrap(), "480");
    }
}
