//! Domain types for trackers, categories, and completion records.
//!
//! These are plain value types: identity and equality rules live here,
//! persistence lives in `storage`, and date-based filtering in `schedule`.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Day of the week a tracker can be scheduled on.
///
/// Canonical indices are Monday=0 through Sunday=6. The mapping from a
/// calendar date is locale-independent: ISO weekday 1 (Monday) maps to
/// index 0 and ISO weekday 7 (Sunday) maps to index 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in canonical order, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Canonical index, Monday=0 ... Sunday=6.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Weekday for a canonical index, if in range.
    pub fn from_index(index: u8) -> Option<Weekday> {
        Weekday::ALL.get(index as usize).copied()
    }

    /// Weekday of a calendar date.
    pub fn from_date(date: NaiveDate) -> Weekday {
        // num_days_from_monday is 0=Monday..6=Sunday, exactly the canonical index.
        Weekday::ALL[date.weekday().num_days_from_monday() as usize]
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        };
        f.write_str(name)
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(Weekday::Monday),
            "tue" | "tuesday" => Ok(Weekday::Tuesday),
            "wed" | "wednesday" => Ok(Weekday::Wednesday),
            "thu" | "thursday" => Ok(Weekday::Thursday),
            "fri" | "friday" => Ok(Weekday::Friday),
            "sat" | "saturday" => Ok(Weekday::Saturday),
            "sun" | "sunday" => Ok(Weekday::Sunday),
            other => Err(format!("unknown weekday '{other}'")),
        }
    }
}

/// Set of weekdays a tracker is active on, stored as a 7-bit mask.
///
/// Bit n corresponds to the weekday with canonical index n. The mask is
/// also the on-disk encoding, so there is exactly one representation of
/// any schedule. Serializes as a list of weekday names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Schedule(u8);

const SCHEDULE_MASK: u8 = 0b0111_1111;

impl Schedule {
    /// Empty schedule. A tracker with an empty schedule is never due.
    pub fn new() -> Schedule {
        Schedule(0)
    }

    /// Schedule covering all seven days.
    pub const EVERY_DAY: Schedule = Schedule(SCHEDULE_MASK);

    /// Build from any collection of weekdays.
    pub fn from_days<I: IntoIterator<Item = Weekday>>(days: I) -> Schedule {
        days.into_iter().collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.index();
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !(1 << day.index());
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Days in canonical order, Monday first.
    pub fn days(self) -> Vec<Weekday> {
        Weekday::ALL
            .iter()
            .copied()
            .filter(|day| self.contains(*day))
            .collect()
    }

    /// Raw 7-bit mask, the canonical storage encoding.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Rebuild from a stored mask. Bits outside the low seven are dropped.
    pub fn from_bits(bits: u8) -> Schedule {
        Schedule(bits & SCHEDULE_MASK)
    }
}

impl FromIterator<Weekday> for Schedule {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Schedule {
        let mut schedule = Schedule::new();
        for day in iter {
            schedule.insert(day);
        }
        schedule
    }
}

impl Serialize for Schedule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.days().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = Vec::<Weekday>::deserialize(deserializer)?;
        Ok(Schedule::from_days(days))
    }
}

/// Fixed display palette; tracker colors are keys into this set.
pub const COLOR_PALETTE: [&str; 18] = [
    "CollectionColor1",
    "CollectionColor2",
    "CollectionColor3",
    "CollectionColor4",
    "CollectionColor5",
    "CollectionColor6",
    "CollectionColor7",
    "CollectionColor8",
    "CollectionColor9",
    "CollectionColor10",
    "CollectionColor11",
    "CollectionColor12",
    "CollectionColor13",
    "CollectionColor14",
    "CollectionColor15",
    "CollectionColor16",
    "CollectionColor17",
    "CollectionColor18",
];

/// Whether `key` names a palette color.
pub fn is_palette_color(key: &str) -> bool {
    COLOR_PALETTE.contains(&key)
}

/// A trackable habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracker {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    /// Key into [`COLOR_PALETTE`].
    pub color: String,
    pub schedule: Schedule,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Tracker {
    /// Whether this tracker is due on `date`.
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.schedule.contains(Weekday::from_date(date))
    }
}

/// Payload for the create-tracker command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTracker {
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub schedule: Schedule,
    pub category_id: Uuid,
}

/// A named grouping of trackers.
///
/// `trackers` is populated (in canonical order) when the category comes out
/// of a store query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerCategory {
    pub id: Uuid,
    pub title: String,
    pub trackers: Vec<Tracker>,
    pub created_at: DateTime<Utc>,
}

/// Evidence that a tracker was completed on a calendar day.
///
/// Equality and hashing cover both fields; `date` is already day-granular,
/// so two records for the same tracker and day are the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackerRecord {
    pub tracker_id: Uuid,
    pub date: NaiveDate,
}
