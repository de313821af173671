//! Change notifications emitted by the store.
//!
//! Every committed mutation produces one [`ChangeEvent`] per affected entity
//! kind. Consumers subscribe through
//! [`TrackerStore::subscribe`](crate::storage::TrackerStore::subscribe) and
//! read events off an mpsc receiver instead of polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Receiver;

/// Entity kind a committed change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Category,
    Tracker,
    Record,
}

/// A committed-change notification.
///
/// Delivery is after-commit and fire-and-forget: a slow or dropped
/// subscriber never blocks the mutation that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

/// Identifier of an active subscription, used to unsubscribe.
pub type SubscriptionId = u64;

/// Receiving half of a store subscription.
///
/// Dropping the subscription stops delivery; the store prunes the dead
/// sender on its next notification pass. Call
/// [`TrackerStore::unsubscribe`](crate::storage::TrackerStore::unsubscribe)
/// with `id` to detach eagerly.
pub struct Subscription {
    pub id: SubscriptionId,
    pub events: Receiver<ChangeEvent>,
}
