//! Per-repository load state.
//!
//! Ensures at most one fetch is in flight for a repository entry.

/// Fetch state of a single repository entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

impl LoadState {
    /// True if a new fetch can be started.
    pub fn can_start_refresh(self) -> bool {
        matches!(self, LoadState::Idle)
    }

    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// State after a fetch was started.
    pub fn on_refresh_started(self) -> Self {
        LoadState::Loading
    }

    /// State after a fetch settled, whatever its result.
    pub fn on_refresh_done(self) -> Self {
        LoadState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_allows_refresh() {
        assert!(LoadState::Idle.can_start_refresh());
        assert!(!LoadState::Idle.is_loading());
    }

    #[test]
    fn loading_blocks_refresh() {
        assert!(!LoadState::Loading.can_start_refresh());
        assert!(LoadState::Loading.is_loading());
    }

    #[test]
    fn refresh_cycle_returns_to_idle() {
        let started = LoadState::default().on_refresh_started();
        assert_eq!(started, LoadState::Loading);
        assert_eq!(started.on_refresh_done(), LoadState::Idle);
    }
}
