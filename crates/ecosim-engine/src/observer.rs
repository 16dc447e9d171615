//! Clock observer that reports progress through the log.

use ecosim_core::ClockObserver;
use ecosim_types::{SimulationData, Species};
use tracing::{info, warn};

/// Logs a population line every `interval` ticks and a warning whenever a
/// species dies out.
#[derive(Debug, Clone, Copy)]
pub struct LogObserver {
    interval: u64,
}

impl LogObserver {
    /// Create an observer reporting every `interval` ticks (at least 1).
    pub const fn new(interval: u64) -> Self {
        Self {
            interval: if interval == 0 { 1 } else { interval },
        }
    }

    /// Whether the tick that produced `time_step` should be reported.
    pub const fn should_report(self, time_step: u64) -> bool {
        matches!(time_step.checked_rem(self.interval), Some(0))
    }
}

impl ClockObserver for LogObserver {
    fn on_update(&self, data: &SimulationData) {
        let eco = &data.ecosystem;
        if !self.should_report(eco.time_step) {
            return;
        }
        info!(
            time_step = eco.time_step,
            grass = eco.counts.grass,
            cow = eco.counts.cow,
            tiger = eco.counts.tiger,
            speed = data.speed,
            "Population"
        );
    }

    fn on_extinction(&self, species: &[Species]) {
        for s in species {
            warn!(species = %s, role = s.trophic_role(), "Species went extinct");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_reports_every_tick() {
        let observer = LogObserver::new(0);
        assert!(observer.should_report(1));
        assert!(observer.should_report(2));
    }

    #[test]
    fn interval_check_is_usable_in_const_context() {
        const EVERY_TEN: LogObserver = LogObserver::new(10);
        const AT_TWENTY: bool = EVERY_TEN.should_report(20);
        const AT_TWENTY_ONE: bool = EVERY_TEN.should_report(21);
        assert!(AT_TWENTY);
        assert!(!AT_TWENTY_ONE);
    }

    #[test]
    fn reports_on_interval_boundaries() {
        let observer = LogObserver::new(50);
        assert!(!observer.should_report(49));
        assert!(observer.should_report(50));
        assert!(observer.should_report(100));
    }
}
