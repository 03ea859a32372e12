//! Trailing-edge debouncer driven by caller-supplied timestamps.
//!
//! Used to coalesce bursts of detector reconfiguration requests: only the
//! last value submitted is released, once no new value has arrived for the
//! quiet period.

/// Holds the most recent submission until its quiet period has elapsed
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet_period_micros: u64,
    pending: Option<(T, u64)>,
}

impl<T> Debouncer<T> {
    #[must_use]
    pub const fn new(quiet_period_micros: u64) -> Self {
        Self {
            quiet_period_micros,
            pending: None,
        }
    }

    /// Create a debouncer from a millisecond quiet period
    #[must_use]
    pub const fn from_millis(quiet_period_ms: u64) -> Self {
        Self::new(quiet_period_ms.saturating_mul(1000))
    }

    #[must_use]
    pub const fn quiet_period_micros(&self) -> u64 {
        self.quiet_period_micros
    }

    pub fn set_quiet_period_micros(&mut self, quiet_period_micros: u64) {
        self.quiet_period_micros = quiet_period_micros;
    }

    /// Replace any pending value and restart the quiet period at `now_micros`
    pub fn submit(&mut self, value: T, now_micros: u64) {
        self.pending = Some((value, now_micros));
    }

    /// Release the pending value if the quiet period has elapsed at `now_micros`
    pub fn poll(&mut self, now_micros: u64) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, submitted)| now_micros.saturating_sub(*submitted) >= self.quiet_period_micros);
        if ready {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without releasing it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }
}
