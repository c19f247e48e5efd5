//! Admission control for browser automation calls.
//!
//! Each fetch launches a full Chromium process, so new work is only admitted
//! while the host has CPU and memory headroom. Waiters poll the same global
//! reading; there is no queue or priority among them.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sysinfo::System;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Minimum free memory required to admit a new automation call, in MB.
pub const MIN_FREE_MEMORY_MB: u64 = 300;

/// Maximum CPU utilization tolerated when admitting a new automation call.
pub const MAX_CPU_PERCENT: f32 = 80.0;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// One instantaneous reading of host resource pressure.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSample {
    pub available_memory_mb: u64,
    pub cpu_percent: f32,
}

/// Source of resource readings. Production samples the OS; tests substitute
/// scripted values.
pub trait ResourceSampler: Send + Sync {
    fn sample(&self) -> ResourceSample;
}

/// Samples CPU and memory through a persistent sysinfo handle.
///
/// The handle is kept alive because CPU usage is computed as a delta between
/// consecutive refreshes; a fresh `System` per call would always read zero.
pub struct SystemSampler {
    system: Mutex<System>,
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SystemSampler {
    fn sample(&self) -> ResourceSample {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_memory();
        system.refresh_cpu_usage();

        // Some platforms report 0 for "available" memory; fall back to free.
        let available_bytes = match system.available_memory() {
            0 => system.free_memory(),
            bytes => bytes,
        };

        ResourceSample {
            available_memory_mb: available_bytes / (1024 * 1024),
            cpu_percent: system.global_cpu_info().cpu_usage().clamp(0.0, 100.0),
        }
    }
}

/// Decides whether a new automation call may start, and counts how many are
/// currently executing.
pub struct ResourceGate {
    sampler: Box<dyn ResourceSampler>,
    poll_interval: Duration,
    in_flight: AtomicUsize,
}

impl ResourceGate {
    pub fn new() -> Self {
        Self::with_sampler(Box::new(SystemSampler::new()))
    }

    pub fn with_sampler(sampler: Box<dyn ResourceSampler>) -> Self {
        Self {
            sampler,
            poll_interval: POLL_INTERVAL,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// True iff the host has headroom for another automation call.
    ///
    /// The in-flight count is not part of the decision; it is informational
    /// only.
    pub fn can_admit(&self) -> bool {
        let sample = self.sampler.sample();
        sample.available_memory_mb > MIN_FREE_MEMORY_MB && sample.cpu_percent < MAX_CPU_PERCENT
    }

    /// Poll until resources free up or `timeout` elapses, returning false on
    /// timeout.
    ///
    /// Known gap carried over from the original service: there is no
    /// cancellation hook, so a client that disconnects still rides out the
    /// full wait.
    pub async fn wait_for_admission(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.can_admit() {
                return true;
            }
            if start.elapsed() >= timeout {
                warn!("timeout waiting for resources");
                return false;
            }
            debug!("waiting for resources to become available");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Register one executing automation call. Dropping the guard
    /// unregisters it, on success and error paths alike.
    pub fn track(&self) -> InFlightGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            counter: &self.in_flight,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ResourceGate {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}
