//! Wall-clock timing for pipeline phases.
//!
//! A [`PhaseTimer`] accumulates the duration of repeated runs of one phase
//! (for example every `render` pass of a page) and reports the average.

use std::time::{Duration, Instant};

/// Accumulates timings for a named pipeline phase.
#[derive(Debug)]
pub struct PhaseTimer {
    name: &'static str,
    started: Option<Instant>,
    total: Duration,
    count: u32,
}

impl PhaseTimer {
    /// Create a timer for the phase called `name`.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            started: None,
            total: Duration::ZERO,
            count: 0,
        }
    }

    /// Mark the start of one run of the phase.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Mark the end of the current run. A stop without a start is ignored.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.total += started.elapsed();
            self.count += 1;
        }
    }

    /// Number of completed runs since the last report.
    #[must_use]
    pub const fn runs(&self) -> u32 {
        self.count
    }

    /// Average run time since the last report, then reset the counters.
    ///
    /// Returns `None` when nothing was timed.
    pub fn report(&mut self) -> Option<String> {
        if self.count == 0 {
            return None;
        }
        let average = self.total / self.count;
        self.total = Duration::ZERO;
        self.count = 0;
        Some(format!(
            "Time in {} on average: {:.0}ms",
            self.name,
            average.as_secs_f64() * 1000.0
        ))
    }
}
