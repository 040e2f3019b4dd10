use std::time::Duration;

/// Engine tunables.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use notesync::EngineConfig;
///
/// let config = EngineConfig::new()
///     .refresh_period(Duration::from_secs(10))
///     .debounce_delay(Duration::from_millis(250));
/// assert_eq!(config.refresh_period, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Period of the background reconciliation timer while the view is
    /// focused and the host is foregrounded.
    pub refresh_period: Duration,

    /// Quiet period after the last search/filter change before a fetch fires.
    pub debounce_delay: Duration,

    /// Delay before the one-shot quiet reconciliation that follows a
    /// mutation's confirmation or failure.
    pub reconcile_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_period: Duration::from_secs(30),
            debounce_delay: Duration::from_millis(500),
            reconcile_delay: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }
}
