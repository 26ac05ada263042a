//! Configuration for replay.

/// Configuration for a [`Replayer`](crate::Replayer).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplayConfig {
    /// Retry a compound's failed sub-action once after running the burns and
    /// conversions that follow it.
    pub retry_affordability: bool,

    /// Snapshots kept for stepping back.
    pub history_limit: usize,

    /// Stop [`run`](crate::Replayer::run) at the first failing item.
    pub stop_on_error: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            retry_affordability: true,
            history_limit: 512,
            stop_on_error: true,
        }
    }
}

impl ReplayConfig {
    /// Every item must execute exactly as logged.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            retry_affordability: false,
            ..Self::default()
        }
    }

    /// Keeps going past failing items and collects their errors.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            stop_on_error: false,
            ..Self::default()
        }
    }

    /// Builder method to enable or disable affordability retries.
    #[must_use]
    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry_affordability = retry;
        self
    }

    /// Builder method to set the history limit.
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Builder method to choose whether errors stop a run.
    #[must_use]
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }
}
