/// Performance measurement utilities
/// Each pipeline stage can be timed and logged for optimization analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::trace!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Per-frame stage timings, filled in by the renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfStats {
    pub setup_us: f64,
    pub rasterization_us: f64,
    pub tracing_us: f64,
    pub total_us: f64,
}

impl PerfStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn percent(&self, part: f64) -> f64 {
        if self.total_us > 0.0 {
            part / self.total_us * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        log::debug!(
            "setup {:.2}μs ({:.1}%), raster {:.2}μs ({:.1}%), trace {:.2}μs ({:.1}%), total {:.2}μs",
            self.setup_us,
            self.percent(self.setup_us),
            self.rasterization_us,
            self.percent(self.rasterization_us),
            self.tracing_us,
            self.percent(self.tracing_us),
            self.total_us
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
