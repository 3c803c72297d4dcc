//! In-memory report transforms over the joined stage history
//!
//! Every report takes the event rows already fetched by
//! [`StageEventRepo`](crate::repo::StageEventRepo) and reshapes them without
//! touching the database, so the shape of a result never depends on
//! generated SQL.

pub mod pivot;
pub mod duration;
pub mod window;
pub mod entries;
pub mod summary;

pub use pivot::*;
pub use duration::*;
pub use window::*;
pub use entries::*;
pub use summary::*;

use serde::Serialize;
use std::collections::BTreeMap;
use crate::models::StageEvent;

/// A user-requested refresh of one or more reports
///
/// The sequence number is owned by whoever drives the refreshes and is only
/// echoed back for display. `as_of` is the evaluation time for windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshTrigger {
    pub sequence: u64,
    pub as_of: i64,
}

impl RefreshTrigger {
    pub fn first(as_of: i64) -> Self {
        RefreshTrigger { sequence: 1, as_of }
    }
}

/// Group events by client id, each group in chronological order
pub fn group_by_client(events: &[StageEvent]) -> BTreeMap<i64, Vec<&StageEvent>> {
    let mut groups: BTreeMap<i64, Vec<&StageEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.client_id).or_default().push(event);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.chronological_cmp(b));
    }
    groups
}

/// Build the external CRM profile link for a client
pub fn profile_link(prefix: &str, client_id: i64) -> String {
    format!("{}{}", prefix, client_id)
}
