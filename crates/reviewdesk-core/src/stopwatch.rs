//! Per-item stopwatches keyed by item URL.
//!
//! A missing entry is equivalent to a paused stopwatch at zero, and that
//! state is never written to storage: resetting deletes the entry instead.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::StorageError;
use crate::storage::{load_json, save_json, KeyValueStore, STOPWATCHES_KEY};

/// State of a single stopwatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StopwatchState {
    Paused {
        #[serde(rename = "accumulatedTime")]
        accumulated_ms: u64,
    },
    Running {
        #[serde(rename = "accumulatedTime")]
        accumulated_ms: u64,
        #[serde(rename = "startTime", with = "chrono::serde::ts_milliseconds")]
        start_time: DateTime<Utc>,
    },
}

impl Default for StopwatchState {
    fn default() -> Self {
        StopwatchState::Paused { accumulated_ms: 0 }
    }
}

impl StopwatchState {
    pub fn is_running(&self) -> bool {
        matches!(self, StopwatchState::Running { .. })
    }

    /// Paused at zero, i.e. indistinguishable from no stopwatch at all.
    pub fn is_zero(&self) -> bool {
        matches!(self, StopwatchState::Paused { accumulated_ms: 0 })
    }

    /// Time banked before the current run, if any.
    pub fn accumulated(&self) -> Duration {
        match *self {
            StopwatchState::Paused { accumulated_ms }
            | StopwatchState::Running { accumulated_ms, .. } => {
                Duration::from_millis(accumulated_ms)
            }
        }
    }

    /// Total elapsed time as of `now`, including the current run.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            StopwatchState::Paused { accumulated_ms } => Duration::from_millis(accumulated_ms),
            StopwatchState::Running { accumulated_ms, start_time } => {
                Duration::from_millis(accumulated_ms) + since(start_time, now)
            }
        }
    }

    /// Formatted reading as of `now`.
    ///
    /// Running stopwatches show seconds; paused ones are rounded up to the
    /// minute.
    pub fn display_at(&self, now: DateTime<Utc>) -> String {
        let elapsed = self.elapsed_at(now);
        if self.is_running() {
            format_elapsed(elapsed)
        } else {
            format_elapsed_minutes(elapsed)
        }
    }

    fn started(self, now: DateTime<Utc>) -> Option<Self> {
        match self {
            StopwatchState::Paused { accumulated_ms } => {
                Some(StopwatchState::Running { accumulated_ms, start_time: now })
            }
            StopwatchState::Running { .. } => None,
        }
    }

    fn paused(self, now: DateTime<Utc>) -> Option<Self> {
        match self {
            StopwatchState::Running { .. } => Some(StopwatchState::Paused {
                accumulated_ms: millis(self.elapsed_at(now)),
            }),
            StopwatchState::Paused { .. } => None,
        }
    }
}

fn since(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // a clock that went backwards counts as no time
    (now - start).to_std().unwrap_or(Duration::ZERO)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn join_units(units: &[(u64, &str)]) -> String {
    units
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hours, minutes and whole seconds, e.g. `1h 2m 5s`. Zero renders empty.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    join_units(&[(secs / 3600, "h"), (secs % 3600 / 60, "m"), (secs % 60, "s")])
}

/// Whole hours, then minutes with any sub-minute remainder rounded up.
///
/// Hours are split off first, so `59m 30s` renders `60m`.
pub fn format_elapsed_minutes(elapsed: Duration) -> String {
    let ms = millis(elapsed);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000).div_ceil(60_000);
    join_units(&[(hours, "h"), (minutes, "m")])
}

/// Stopwatch states for all items, persisted on every transition.
pub struct StopwatchEngine {
    states: Mutex<BTreeMap<String, StopwatchState>>,
    store: Arc<dyn KeyValueStore>,
}

impl StopwatchEngine {
    /// Load persisted stopwatches. Corrupt data yields an empty map.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let mut states: BTreeMap<String, StopwatchState> =
            load_json(store.as_ref(), STOPWATCHES_KEY)?;
        states.retain(|_, state| !state.is_zero());

        tracing::debug!("Loaded {} stopwatches", states.len());
        Ok(Self { states: Mutex::new(states), store })
    }

    /// Current state for `url`; paused at zero when unknown.
    pub fn state(&self, url: &str) -> StopwatchState {
        self.states.lock().get(url).copied().unwrap_or_default()
    }

    /// Snapshot of every stored stopwatch.
    pub fn states(&self) -> BTreeMap<String, StopwatchState> {
        self.states.lock().clone()
    }

    pub fn start(&self, url: &str) -> Result<bool, StorageError> {
        self.start_at(url, Utc::now())
    }

    pub fn pause(&self, url: &str) -> Result<bool, StorageError> {
        self.pause_at(url, Utc::now())
    }

    /// Start the stopwatch for `url`. Returns `false` if it was already running.
    pub fn start_at(&self, url: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.transition(url, |state| state.started(now))
    }

    /// Pause the stopwatch for `url`. Returns `false` if it was not running.
    pub fn pause_at(&self, url: &str, now: DateTime<Utc>) -> Result<bool, StorageError> {
        self.transition(url, |state| state.paused(now))
    }

    /// Reset `url` to zero, removing it from storage.
    pub fn reset(&self, url: &str) -> Result<bool, StorageError> {
        self.transition(url, |_| Some(StopwatchState::default()))
    }

    fn transition<F>(&self, url: &str, next: F) -> Result<bool, StorageError>
    where
        F: FnOnce(StopwatchState) -> Option<StopwatchState>,
    {
        let mut states = self.states.lock();
        let current = states.get(url).copied().unwrap_or_default();

        let Some(next) = next(current) else {
            tracing::debug!("Ignoring stopwatch transition for {} in state {:?}", url, current);
            return Ok(false);
        };

        let mut updated = states.clone();
        if next.is_zero() {
            updated.remove(url);
        } else {
            updated.insert(url.to_string(), next);
        }

        save_json(self.store.as_ref(), STOPWATCHES_KEY, &updated)?;
        *states = updated;

        tracing::debug!("Stopwatch {} -> {:?}", url, next);
        Ok(true)
    }
}

/// Periodic redraw of a running stopwatch.
///
/// Ticks only format the current reading; they never touch stored state.
/// The ticker stops itself once the stopwatch leaves `Running`, and dropping
/// it stops it too, so hosts drop it when the item leaves the screen.
pub struct StopwatchTicker {
    token: CancellationToken,
    _guard: DropGuard,
}

impl StopwatchTicker {
    /// Call `on_tick` with the formatted reading of `url` every `period`
    /// while its stopwatch is running. Paused stopwatches produce an idle
    /// ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(
        engine: Arc<StopwatchEngine>,
        url: impl Into<String>,
        period: Duration,
        mut on_tick: F,
    ) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let url = url.into();
        let token = CancellationToken::new();

        if engine.state(&url).is_running() {
            let cancelled = token.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        biased;
                        _ = cancelled.cancelled() => break,
                        _ = interval.tick() => {
                            let state = engine.state(&url);
                            if !state.is_running() {
                                tracing::debug!("Stopwatch {} stopped, ending ticker", url);
                                cancelled.cancel();
                                break;
                            }
                            on_tick(state.display_at(Utc::now()));
                        }
                    }
                }
            });
        } else {
            token.cancel();
        }

        Self { token: token.clone(), _guard: token.drop_guard() }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}
