use maneuver_config::DebounceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceAction {
    /// DeltaV drifted far enough that event times must be re-solved.
    Resolve,
    /// Only countdown text is due for a refresh.
    Refresh,
    Idle,
}

/// Rate limiter between full event re-solves and cheap countdown refreshes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debounce {
    config: DebounceConfig,
    resolved_magnitude: f64,
    since_refresh: f64,
}

impl Debounce {
    pub fn new(config: DebounceConfig, magnitude: f64) -> Self {
        Self {
            config,
            resolved_magnitude: magnitude,
            since_refresh: 0.0,
        }
    }

    /// Advance by `dt` seconds with the node's current DeltaV magnitude.
    pub fn check(&mut self, dt: f64, magnitude: f64) -> DebounceAction {
        if (magnitude - self.resolved_magnitude).abs() > self.config.dv_drift_m_s {
            return DebounceAction::Resolve;
        }
        self.since_refresh += dt;
        if self.since_refresh > self.config.refresh_interval_s {
            self.since_refresh = 0.0;
            DebounceAction::Refresh
        } else {
            DebounceAction::Idle
        }
    }

    pub fn mark_resolved(&mut self, magnitude: f64) {
        self.resolved_magnitude = magnitude;
        self.since_refresh = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_forces_resolve_and_timer_refreshes() {
        let mut debounce = Debounce::new(DebounceConfig::default(), 100.0);
        assert_eq!(debounce.check(0.2, 105.0), DebounceAction::Idle);
        assert_eq!(debounce.check(0.2, 109.0), DebounceAction::Idle);
        assert_eq!(debounce.check(0.2, 109.0), DebounceAction::Refresh);
        assert_eq!(debounce.check(0.1, 111.0), DebounceAction::Resolve);
        debounce.mark_resolved(111.0);
        assert_eq!(debounce.check(0.1, 111.0), DebounceAction::Idle);
    }
}
