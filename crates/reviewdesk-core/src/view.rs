//! Items joined with their stopwatch readings, ready to render.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PullRequest;
use crate::stopwatch::{StopwatchEngine, StopwatchState};

/// A review item together with its stopwatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedItem {
    pub item: PullRequest,
    pub stopwatch: StopwatchState,
    /// Formatted reading, empty when no time was recorded
    pub elapsed: String,
}

impl AnnotatedItem {
    pub fn is_dimmed(&self) -> bool {
        self.item.status.is_dimmed()
    }
}

/// Attach stopwatch readings as of `now` to `items`, keeping their order.
pub fn annotate(
    items: &[PullRequest],
    stopwatches: &StopwatchEngine,
    now: DateTime<Utc>,
) -> Vec<AnnotatedItem> {
    items
        .iter()
        .map(|item| {
            let stopwatch = stopwatches.state(&item.url);
            AnnotatedItem {
                item: item.clone(),
                stopwatch,
                elapsed: stopwatch.display_at(now),
            }
        })
        .collect()
}
