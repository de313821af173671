//! # Habitlog Core Library
//!
//! Core business logic for the Habitlog habit tracker. All operations are
//! available through this library; the CLI binary is a thin layer over it,
//! and any future GUI is expected to consume the same surface.
//!
//! ## Architecture
//!
//! - **Model**: plain value types for trackers, categories, completion
//!   records, and weekday schedules
//! - **Storage**: SQLite-backed [`TrackerStore`] with a subscribe/notify
//!   change feed, plus TOML-based configuration
//! - **Schedule**: pure due-date matching and display filters over a store
//!   snapshot
//! - **Stats**: aggregate metrics derived from the completion ledger
//!
//! ## Key Components
//!
//! - [`TrackerStore`]: category/tracker/record persistence and change feed
//! - [`TrackerFilter`]: display filtering for a reference date
//! - [`StatisticsSummary`]: completed total, best period, ideal days, average

pub mod error;
pub mod events;
pub mod model;
pub mod schedule;
pub mod stats;
pub mod storage;

pub use error::{ConfigError, CoreError, StoreError};
pub use events::{ChangeEvent, ChangeKind, Subscription, SubscriptionId};
pub use model::{
    NewTracker, Schedule, Tracker, TrackerCategory, TrackerRecord, Weekday, COLOR_PALETTE,
};
pub use schedule::{apply_filter, due_trackers, visible_categories, TrackerFilter};
pub use stats::{summarize, StatisticsSummary};
pub use storage::{Config, TrackerStore};
