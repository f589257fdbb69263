//! Stage timing.

use std::time::Instant;

/// Measures how long a named unit of work takes.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the timer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_reports_name_and_monotonic_elapsed() {
        let timer = SpanTimer::start("get_invoker");
        let first = timer.elapsed_ms();
        let second = timer.elapsed_ms();

        assert_eq!(timer.name(), "get_invoker");
        assert!(first >= 0.0);
        assert!(second >= first);
        assert!(timer.finish() >= second);
    }
}
