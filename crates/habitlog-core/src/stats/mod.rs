//! Statistics derived from the completion ledger.
//!
//! All metrics are total: an empty ledger yields an all-zero summary, never
//! an error.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::model::{TrackerCategory, TrackerRecord, Weekday};

/// Aggregate metrics shown on the statistics screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    /// Total completion records across all trackers.
    pub completed_trackers: u64,
    /// Longest run of consecutive calendar days with at least one completion.
    pub best_period: u32,
    /// Days on which every tracker scheduled for that weekday was completed.
    pub ideal_days: u32,
    /// Completions per day with at least one completion; 0 for an empty ledger.
    pub average_value: f64,
}

/// Compute the summary from a snapshot of categories and the full ledger.
pub fn summarize(
    categories: &[TrackerCategory],
    records: &[TrackerRecord],
) -> StatisticsSummary {
    // One pass over the ledger: group completed tracker ids by day.
    let mut by_day: BTreeMap<NaiveDate, HashSet<Uuid>> = BTreeMap::new();
    for record in records {
        by_day.entry(record.date).or_default().insert(record.tracker_id);
    }

    let completed_trackers = records.len() as u64;
    let distinct_days = by_day.len() as u64;

    let average_value = if distinct_days == 0 {
        0.0
    } else {
        completed_trackers as f64 / distinct_days as f64
    };

    let best_period = longest_run(by_day.keys().copied());

    // One pass over categories: which tracker ids are scheduled per weekday.
    let mut scheduled_by_weekday: [Vec<Uuid>; 7] = Default::default();
    for category in categories {
        for tracker in &category.trackers {
            for day in tracker.schedule.days() {
                scheduled_by_weekday[day.index() as usize].push(tracker.id);
            }
        }
    }

    let ideal_days = by_day
        .iter()
        .filter(|(date, completed)| {
            let scheduled = &scheduled_by_weekday[Weekday::from_date(**date).index() as usize];
            !scheduled.is_empty() && scheduled.iter().all(|id| completed.contains(id))
        })
        .count() as u32;

    StatisticsSummary {
        completed_trackers,
        best_period,
        ideal_days,
        average_value,
    }
}

/// Longest run of consecutive days in an ascending day sequence.
fn longest_run<I: IntoIterator<Item = NaiveDate>>(days: I) -> u32 {
    let mut best: u32 = 0;
    let mut current: u32 = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in days {
        current = match previous {
            Some(prev) if prev.checked_add_days(Days::new(1)) == Some(day) => current + 1,
            _ => 1,
        };
        best = best.max(current);
        previous = Some(day);
    }
    best
}
