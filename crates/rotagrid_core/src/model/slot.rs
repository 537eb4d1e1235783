//! Slot addressing for the weekly grid.
//!
//! # Responsibility
//! - Define the 14-value slot key space (7 days x AM/PM).
//! - Provide the lossless `"{day}_{AM|PM}"` wire format.
//! - Keep display ordering (Mon-first) separate from storage ordering
//!   (Sun-first).
//!
//! # Invariants
//! - Exactly 14 distinct `SlotKey` values exist.
//! - `SlotKey` parse/format round-trips losslessly for every valid key.
//! - Storage, comparison and persistence always use Sun=0..Sat=6 order;
//!   `DISPLAY_ORDER` is for rendering only.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Day of week in canonical storage order, Sunday = 0 .. Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

/// Storage-order listing of all days, Sunday first.
pub const STORAGE_ORDER: [DayOfWeek; 7] = [
    DayOfWeek::Sunday,
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
];

/// Rendering-only permutation: Monday first, Sunday last.
///
/// Must never be used to derive persisted indices or wire keys.
pub const DISPLAY_ORDER: [DayOfWeek; 7] = [
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
    DayOfWeek::Sunday,
];

impl DayOfWeek {
    /// Canonical storage index, Sunday = 0 .. Saturday = 6.
    pub fn index(self) -> u8 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }

    /// Inverse of [`DayOfWeek::index`]. Returns `None` outside 0..=6.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Sunday),
            1 => Some(Self::Monday),
            2 => Some(Self::Tuesday),
            3 => Some(Self::Wednesday),
            4 => Some(Self::Thursday),
            5 => Some(Self::Friday),
            6 => Some(Self::Saturday),
            _ => None,
        }
    }

    /// Maps a chrono weekday onto the canonical storage day.
    pub fn from_weekday(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Sun => Self::Sunday,
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
        }
    }
}

/// Half-day slot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Am,
    Pm,
}

impl TimeOfDay {
    /// Wire spelling, `AM` or `PM`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "AM" => Some(Self::Am),
            "PM" => Some(Self::Pm),
            _ => None,
        }
    }

    fn offset(self) -> usize {
        match self {
            Self::Am => 0,
            Self::Pm => 1,
        }
    }
}

/// Identity of one weekly grid cell. Exactly 14 valid values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub day: DayOfWeek,
    pub time: TimeOfDay,
}

/// Number of cells in one weekly grid.
pub const SLOT_COUNT: usize = 14;

/// Every valid slot key in canonical storage order.
pub const ALL_SLOT_KEYS: [SlotKey; SLOT_COUNT] = [
    SlotKey { day: DayOfWeek::Sunday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Sunday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Monday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Monday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Tuesday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Tuesday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Wednesday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Wednesday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Thursday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Thursday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Friday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Friday, time: TimeOfDay::Pm },
    SlotKey { day: DayOfWeek::Saturday, time: TimeOfDay::Am },
    SlotKey { day: DayOfWeek::Saturday, time: TimeOfDay::Pm },
];

impl SlotKey {
    pub fn new(day: DayOfWeek, time: TimeOfDay) -> Self {
        Self { day, time }
    }

    /// Dense storage index in 0..14, `day * 2 + time`.
    pub fn index(self) -> usize {
        usize::from(self.day.index()) * 2 + self.time.offset()
    }
}

/// Failure to parse a wire-format slot key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotKeyParseError {
    input: String,
}

impl Display for SlotKeyParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid slot key `{}`; expected `<0-6>_<AM|PM>`",
            self.input
        )
    }
}

impl Error for SlotKeyParseError {}

impl Display for SlotKey {
    /// Wire format relied on by persisted data: `"{dayIndex}_{AM|PM}"`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.day.index(), self.time.as_str())
    }
}

impl FromStr for SlotKey {
    type Err = SlotKeyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotKeyParseError {
            input: value.to_string(),
        };

        let (day_part, time_part) = value.split_once('_').ok_or_else(invalid)?;
        let day_index: u8 = day_part.parse().map_err(|_| invalid())?;
        let day = DayOfWeek::from_index(day_index).ok_or_else(invalid)?;
        let time = TimeOfDay::parse(time_part).ok_or_else(invalid)?;
        Ok(Self { day, time })
    }
}

impl Serialize for SlotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(DeError::custom)
    }
}

/// Week slot within a 4-week rotation block, validated to 1..=4.
///
/// `Option<WeekNumber>` is the scope type used across the crate: `None`
/// means "all weeks".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekNumber(u8);

impl WeekNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// Returns `None` outside 1..=4.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Display for WeekNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for WeekNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("week number must be 1..=4, got {value}"))
    }
}

impl From<WeekNumber> for u8 {
    fn from(value: WeekNumber) -> Self {
        value.0
    }
}
