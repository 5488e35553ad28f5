use crate::error::MalformedKeyError;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use itertools::Itertools;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Joins the date and the time slot inside a slot key.
/// Neither an ISO date nor `HH:MM` can contain it.
pub const SEPARATOR: char = '_';

const DATE_FORMAT: &str = "%Y-%m-%d";
const SLOT_FORMAT: &str = "%H:%M";

/// A time-of-day at which a candidate meeting may start.
/// Naive wall-clock time, serialised as `HH:MM`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    /// # Examples
    /// ```
    /// use chousei_libs::slot::TimeSlot;
    ///
    /// let slot = TimeSlot::new(9, 30).unwrap();
    /// assert_eq!(slot.to_string(), "09:30");
    /// assert!(TimeSlot::new(25, 0).is_none());
    /// ```
    pub fn new(hour: u32, minute: u32) -> Option<TimeSlot> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(TimeSlot)
    }

    pub fn time(self) -> NaiveTime {
        self.0
    }

    /// The instant this slot starts on `date`.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }
}

impl From<NaiveTime> for TimeSlot {
    fn from(time: NaiveTime) -> Self {
        TimeSlot(time)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SLOT_FORMAT))
    }
}

impl FromStr for TimeSlot {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, SLOT_FORMAT).map(TimeSlot)
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|_| de::Error::custom(format!("invalid time slot `{}`, expected HH:MM", raw)))
    }
}

/// Every slot from `start` to `end` inclusive, `step_minutes` apart.
/// Stops at midnight rather than wrapping into the next day.
///
/// # Examples
/// ```
/// use chousei_libs::slot::{slot_grid, TimeSlot};
///
/// let grid = slot_grid(TimeSlot::new(9, 0).unwrap(), TimeSlot::new(10, 0).unwrap(), 30);
/// let labels: Vec<String> = grid.iter().map(|s| s.to_string()).collect();
/// assert_eq!(labels, vec!["09:00", "09:30", "10:00"]);
/// ```
pub fn slot_grid(start: TimeSlot, end: TimeSlot, step_minutes: u32) -> Vec<TimeSlot> {
    if step_minutes == 0 {
        return vec![];
    }

    let step = Duration::minutes(i64::from(step_minutes));
    let mut slots = Vec::new();
    let mut current = start.0;

    while current <= end.0 {
        slots.push(TimeSlot(current));

        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    slots
}

/// `09:00` through `18:00` in 30 minute steps: the 19 slots every event offers.
pub fn canonical_slots() -> Vec<TimeSlot> {
    slot_grid(on_the_hour(9), on_the_hour(18), 30)
}

fn on_the_hour(hour: u32) -> TimeSlot {
    TimeSlot::new(hour, 0).expect("hour within a day")
}

/// Canonical key of a (date, slot) pair: `"{date}_{HH:MM}"`.
/// This is the join key between an event's grid and every stored answer map,
/// so the format must never change.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use chousei_libs::slot::{decode, encode, TimeSlot};
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let slot = TimeSlot::new(13, 30).unwrap();
///
/// let key = encode(date, slot);
/// assert_eq!(key, "2024-01-15_13:30");
/// assert_eq!(decode(&key), Ok((date, slot)));
/// ```
pub fn encode(date: NaiveDate, slot: TimeSlot) -> String {
    format!("{}{}{}", date.format(DATE_FORMAT), SEPARATOR, slot)
}

/// Inverse of [`encode`].
///
/// # Errors
/// `MalformedKeyError` unless the key holds exactly one separator between a
/// valid ISO date and a valid `HH:MM` time.
pub fn decode(key: &str) -> Result<(NaiveDate, TimeSlot), MalformedKeyError> {
    let malformed = || MalformedKeyError {
        key: key.to_string(),
    };

    let (date, slot) = key.split(SEPARATOR).collect_tuple().ok_or_else(malformed)?;
    let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| malformed())?;
    let slot = slot.parse::<TimeSlot>().map_err(|_| malformed())?;

    Ok((date, slot))
}
