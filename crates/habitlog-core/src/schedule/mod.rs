//! Schedule matching and display filtering.
//!
//! Pure functions over a snapshot of (categories, records) pulled from the
//! store. They never fail: inconsistent or empty input yields an empty
//! result, not an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::model::{Tracker, TrackerCategory, TrackerRecord};

/// Display filter for the tracker list.
///
/// `Completed` and `Incomplete` are evaluated against completion state for
/// the reference date specifically, not globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerFilter {
    All,
    DueToday,
    Completed,
    Incomplete,
}

impl fmt::Display for TrackerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackerFilter::All => "all",
            TrackerFilter::DueToday => "today",
            TrackerFilter::Completed => "completed",
            TrackerFilter::Incomplete => "incomplete",
        };
        f.write_str(name)
    }
}

impl FromStr for TrackerFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TrackerFilter::All),
            "today" | "due" | "due_today" => Ok(TrackerFilter::DueToday),
            "completed" => Ok(TrackerFilter::Completed),
            "incomplete" | "uncompleted" => Ok(TrackerFilter::Incomplete),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

/// Categories filtered to trackers due on `date`; empty categories dropped.
pub fn due_trackers(categories: &[TrackerCategory], date: NaiveDate) -> Vec<TrackerCategory> {
    categories
        .iter()
        .filter_map(|category| {
            let due: Vec<Tracker> = category
                .trackers
                .iter()
                .filter(|tracker| tracker.is_scheduled_on(date))
                .cloned()
                .collect();
            if due.is_empty() {
                None
            } else {
                Some(TrackerCategory {
                    id: category.id,
                    title: category.title.clone(),
                    trackers: due,
                    created_at: category.created_at,
                })
            }
        })
        .collect()
}

/// Trackers matching `filter` for `date`, given the completion ledger.
pub fn apply_filter(
    trackers: &[Tracker],
    filter: TrackerFilter,
    date: NaiveDate,
    records: &[TrackerRecord],
) -> Vec<Tracker> {
    let completed = completed_on(records, date);
    trackers
        .iter()
        .filter(|tracker| match filter {
            TrackerFilter::All => true,
            TrackerFilter::DueToday => tracker.is_scheduled_on(date),
            TrackerFilter::Completed => completed.contains(&tracker.id),
            TrackerFilter::Incomplete => !completed.contains(&tracker.id),
        })
        .cloned()
        .collect()
}

/// Per-category filter application; empty categories are dropped.
///
/// This is the full screen pipeline: what a tracker list shows for a given
/// date and filter selection.
pub fn visible_categories(
    categories: &[TrackerCategory],
    filter: TrackerFilter,
    date: NaiveDate,
    records: &[TrackerRecord],
) -> Vec<TrackerCategory> {
    categories
        .iter()
        .filter_map(|category| {
            let visible = apply_filter(&category.trackers, filter, date, records);
            if visible.is_empty() {
                None
            } else {
                Some(TrackerCategory {
                    id: category.id,
                    title: category.title.clone(),
                    trackers: visible,
                    created_at: category.created_at,
                })
            }
        })
        .collect()
}

fn completed_on(records: &[TrackerRecord], date: NaiveDate) -> HashSet<Uuid> {
    records
        .iter()
        .filter(|record| record.date == date)
        .map(|record| record.tracker_id)
        .collect()
}
