//! Tracker management commands for CLI.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use habitlog_core::model::{NewTracker, Schedule, TrackerCategory, Weekday};
use habitlog_core::schedule::{visible_categories, TrackerFilter};
use habitlog_core::storage::TrackerStore;
use uuid::Uuid;

use super::check_name_limit;

#[derive(Subcommand)]
pub enum TrackerAction {
    /// Create a new tracker
    Create {
        /// Tracker name
        name: String,
        /// Emoji label
        #[arg(long)]
        emoji: String,
        /// Palette color key (CollectionColor1 .. CollectionColor18)
        #[arg(long, default_value = "CollectionColor1")]
        color: String,
        /// Comma-separated active weekdays (mon,tue,...); empty for none
        #[arg(long, default_value = "")]
        days: String,
        /// Title of the category to file the tracker under
        #[arg(long)]
        category: String,
    },
    /// List trackers grouped by category
    List {
        /// Restrict to one category title
        #[arg(long)]
        category: Option<String>,
        /// Reference date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Display filter: all, today, completed, incomplete
        #[arg(long, default_value = "all")]
        filter: TrackerFilter,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a tracker
    Update {
        /// Tracker ID
        id: Uuid,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New emoji label
        #[arg(long)]
        emoji: Option<String>,
        /// New palette color key
        #[arg(long)]
        color: Option<String>,
        /// New comma-separated active weekdays
        #[arg(long)]
        days: Option<String>,
        /// Move to the category with this title
        #[arg(long)]
        category: Option<String>,
    },
    /// Delete a tracker and its completion records
    Delete {
        /// Tracker ID
        id: Uuid,
    },
    /// Toggle completion for a date
    Toggle {
        /// Tracker ID
        id: Uuid,
        /// Date to toggle (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: TrackerAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TrackerStore::open()?;

    match action {
        TrackerAction::Create {
            name,
            emoji,
            color,
            days,
            category,
        } => {
            check_name_limit(&name, "tracker name")?;
            let category = find_category(&store, &category)?;
            let tracker = store.create_tracker(&NewTracker {
                name,
                emoji,
                color,
                schedule: parse_days(&days)?,
                category_id: category.id,
            })?;
            println!(
                "Tracker created: {} {} ({})",
                tracker.emoji, tracker.name, tracker.id
            );
        }
        TrackerAction::List {
            category,
            date,
            filter,
            json,
        } => {
            let mut categories = store.list_categories()?;
            if let Some(title) = &category {
                categories.retain(|c| c.title.eq_ignore_ascii_case(title));
            }
            let reference = date.unwrap_or_else(|| Local::now().date_naive());
            let records = store.list_completions(None)?;
            let visible = visible_categories(&categories, filter, reference, &records);

            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else if visible.is_empty() {
                println!("No trackers match");
            } else {
                for category in &visible {
                    println!("{}", category.title);
                    for tracker in &category.trackers {
                        let mark = if store.is_completed(tracker.id, reference)? {
                            "x"
                        } else {
                            " "
                        };
                        let days: Vec<String> = tracker
                            .schedule
                            .days()
                            .iter()
                            .map(|d| d.to_string())
                            .collect();
                        println!(
                            "  [{mark}] {} {} ({}) [{}]",
                            tracker.emoji,
                            tracker.name,
                            tracker.id,
                            days.join(",")
                        );
                    }
                }
            }
        }
        TrackerAction::Update {
            id,
            name,
            emoji,
            color,
            days,
            category,
        } => {
            let mut tracker = store
                .get_tracker(id)?
                .ok_or_else(|| format!("tracker {id} not found"))?;
            if let Some(name) = name {
                check_name_limit(&name, "tracker name")?;
                tracker.name = name;
            }
            if let Some(emoji) = emoji {
                tracker.emoji = emoji;
            }
            if let Some(color) = color {
                tracker.color = color;
            }
            if let Some(days) = days {
                tracker.schedule = parse_days(&days)?;
            }
            if let Some(title) = category {
                tracker.category_id = find_category(&store, &title)?.id;
            }
            store.update_tracker(&tracker)?;
            println!("Tracker updated: {id}");
        }
        TrackerAction::Delete { id } => {
            store.delete_tracker(id)?;
            println!("Tracker deleted: {id}");
        }
        TrackerAction::Toggle { id, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let completed = store.toggle_completion(id, date)?;
            let count = store.completion_count(id)?;
            if completed {
                println!("Completed {id} on {date} ({count} total)");
            } else {
                println!("Uncompleted {id} on {date} ({count} total)");
            }
        }
    }
    Ok(())
}

/// Look up a category by title, case-insensitively.
fn find_category(
    store: &TrackerStore,
    title: &str,
) -> Result<TrackerCategory, Box<dyn std::error::Error>> {
    store
        .list_categories()?
        .into_iter()
        .find(|c| c.title.eq_ignore_ascii_case(title))
        .ok_or_else(|| format!("category '{title}' not found").into())
}

/// Parse a comma-separated weekday list into a schedule.
fn parse_days(days: &str) -> Result<Schedule, Box<dyn std::error::Error>> {
    let mut schedule = Schedule::new();
    for part in days.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        schedule.insert(part.parse::<Weekday>()?);
    }
    Ok(schedule)
}
