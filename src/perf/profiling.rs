/// Instrumentation for hot-path call counting.
/// Counters are only bumped when the `profiling` feature is enabled.
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe performance counters for function call tracking
pub struct FunctionCounters {
    // Geometry stage
    pub vertex_transforms: AtomicU64,
    pub triangles_clip_rejected: AtomicU64,
    pub triangles_culled: AtomicU64,

    // Fragment stage
    pub fragments_tested: AtomicU64,
    pub depth_passed: AtomicU64,
    pub depth_failed: AtomicU64,

    // Ray stage
    pub rays_traced: AtomicU64,
    pub triangle_tests: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            vertex_transforms: AtomicU64::new(0),
            triangles_clip_rejected: AtomicU64::new(0),
            triangles_culled: AtomicU64::new(0),
            fragments_tested: AtomicU64::new(0),
            depth_passed: AtomicU64::new(0),
            depth_failed: AtomicU64::new(0),
            rays_traced: AtomicU64::new(0),
            triangle_tests: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.vertex_transforms.store(0, Ordering::Relaxed);
        self.triangles_clip_rejected.store(0, Ordering::Relaxed);
        self.triangles_culled.store(0, Ordering::Relaxed);
        self.fragments_tested.store(0, Ordering::Relaxed);
        self.depth_passed.store(0, Ordering::Relaxed);
        self.depth_failed.store(0, Ordering::Relaxed);
        self.rays_traced.store(0, Ordering::Relaxed);
        self.triangle_tests.store(0, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            vertex_transforms: self.vertex_transforms.load(Ordering::Relaxed),
            triangles_clip_rejected: self.triangles_clip_rejected.load(Ordering::Relaxed),
            triangles_culled: self.triangles_culled.load(Ordering::Relaxed),
            fragments_tested: self.fragments_tested.load(Ordering::Relaxed),
            depth_passed: self.depth_passed.load(Ordering::Relaxed),
            depth_failed: self.depth_failed.load(Ordering::Relaxed),
            rays_traced: self.rays_traced.load(Ordering::Relaxed),
            triangle_tests: self.triangle_tests.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub vertex_transforms: u64,
    pub triangles_clip_rejected: u64,
    pub triangles_culled: u64,
    pub fragments_tested: u64,
    pub depth_passed: u64,
    pub depth_failed: u64,
    pub rays_traced: u64,
    pub triangle_tests: u64,
}

impl CounterSnapshot {
    /// Fraction of tested fragments that survived the depth test, if any were tested.
    pub fn depth_pass_rate(&self) -> Option<f64> {
        if self.fragments_tested == 0 {
            return None;
        }
        Some(self.depth_passed as f64 / self.fragments_tested as f64)
    }

    /// Log a formatted report at debug level
    pub fn log_report(&self) {
        log::debug!("=== Function Counters ===");
        log::debug!("  vertex transforms:     {:12}", self.vertex_transforms);
        log::debug!("  clip rejected:         {:12}", self.triangles_clip_rejected);
        log::debug!("  backface culled:       {:12}", self.triangles_culled);
        log::debug!("  fragments tested:      {:12}", self.fragments_tested);
        log::debug!("  depth passed:          {:12}", self.depth_passed);
        log::debug!("  depth failed:          {:12}", self.depth_failed);
        if let Some(rate) = self.depth_pass_rate() {
            log::debug!("  depth pass rate:       {:11.2}%", rate * 100.0);
        }
        log::debug!("  rays traced:           {:12}", self.rays_traced);
        log::debug!("  ray/triangle tests:    {:12}", self.triangle_tests);
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
