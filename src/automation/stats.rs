//! Sacrifice counter and rate shown while automation runs.

use std::io::Write;
use std::time::{Duration, Instant};

/// Info-level progress line every this many sacrifices.
const INFO_INTERVAL: u64 = 50;
/// Debug-level progress line every this many sacrifices.
const DEBUG_INTERVAL: u64 = 10;

pub struct PerformanceTracker {
    started: Instant,
    sacrifices: u64,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            sacrifices: 0,
        }
    }

    pub fn sacrifices(&self) -> u64 {
        self.sacrifices
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Counts one sacrifice, refreshes the status line and logs milestones.
    pub fn record_sacrifice(&mut self) {
        self.sacrifices += 1;
        self.print_status();

        if self.sacrifices % INFO_INTERVAL == 0 {
            println!();
            crate::log(&format!(
                "Milestone: {} sacrifices at {:.1}/min",
                self.sacrifices,
                rate_per_minute(self.sacrifices, self.elapsed())
            ));
        } else if self.sacrifices % DEBUG_INTERVAL == 0 {
            crate::debug(&format!(
                "{} sacrifices in {:.1}s",
                self.sacrifices,
                self.elapsed().as_secs_f64()
            ));
        }
    }

    /// Rewrites the status line in place.
    pub fn print_status(&self) {
        print!("\r{}", status_line(self.sacrifices, self.elapsed()));
        let _ = std::io::stdout().flush();
    }
}

/// Sacrifices per minute, 0 before the first one.
pub fn rate_per_minute(sacrifices: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if sacrifices == 0 || secs <= 0.0 {
        return 0.0;
    }
    60.0 / (secs / sacrifices as f64)
}

/// Counter line. The rate is left out until there is something to divide.
pub fn status_line(sacrifices: u64, elapsed: Duration) -> String {
    if sacrifices == 0 {
        return format!("Sacrifices: 0 | Time: {:.1}s", elapsed.as_secs_f64());
    }
    format!(
        "Sacrifices: {} | Rate: {:.1}/min | Time: {:.1}s",
        sacrifices,
        rate_per_minute(sacrifices, elapsed),
        elapsed.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_per_minute() {
        assert_eq!(rate_per_minute(30, Duration::from_secs(60)), 30.0);
        assert_eq!(rate_per_minute(1, Duration::from_millis(500)), 120.0);
    }

    #[test]
    fn test_rate_is_zero_without_sacrifices() {
        assert_eq!(rate_per_minute(0, Duration::from_secs(10)), 0.0);
        assert_eq!(rate_per_minute(5, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            status_line(12, Duration::from_secs(30)),
            "Sacrifices: 12 | Rate: 24.0/min | Time: 30.0s"
        );
    }

    #[test]
    fn test_status_line_without_sacrifices_has_no_rate() {
        assert_eq!(
            status_line(0, Duration::from_millis(4500)),
            "Sacrifices: 0 | Time: 4.5s"
        );
    }

    #[test]
    fn test_counter() {
        let mut tracker = PerformanceTracker::new();
        tracker.record_sacrifice();
        tracker.record_sacrifice();
        assert_eq!(tracker.sacrifices(), 2);
    }
}
