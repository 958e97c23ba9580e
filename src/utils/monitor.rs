//! Process CPU and memory readings taken at the end of each engine phase.

use std::time::Duration;

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
const MIB: u64 = 1024 * 1024;

/// Usage of this process when a phase ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSnapshot {
    pub phase: String,
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
    /// Time since the previous snapshot, or since the monitor was created.
    pub phase_elapsed: Duration,
    pub total_elapsed: Duration,
}

#[cfg(feature = "cli")]
struct CurrentProcess {
    system: Mutex<System>,
    pid: Pid,
}

#[cfg(feature = "cli")]
impl CurrentProcess {
    fn open() -> Option<Self> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("Resource monitoring unavailable: {}", e);
                return None;
            }
        };

        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        Some(Self {
            system: Mutex::new(system),
            pid,
        })
    }

    /// CPU percentage and resident memory in MiB.
    fn sample(&self) -> Option<(f32, u64)> {
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = system.process(self.pid)?;
        Some((process.cpu_usage(), process.memory() / MIB))
    }
}

#[cfg(feature = "cli")]
struct PhaseLog {
    last_mark: Instant,
    peak_rss_mb: u64,
    phases: Vec<(String, Duration)>,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    process: Option<CurrentProcess>,
    started: Instant,
    log: Mutex<PhaseLog>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let started = Instant::now();
        Self {
            process: if enabled { CurrentProcess::open() } else { None },
            started,
            log: Mutex::new(PhaseLog {
                last_mark: started,
                peak_rss_mb: 0,
                phases: Vec::new(),
            }),
        }
    }

    /// Closes the current phase. `None` when monitoring is off.
    pub fn snapshot(&self, phase: &str) -> Option<ResourceSnapshot> {
        let (cpu_percent, rss_mb) = self.process.as_ref()?.sample()?;
        let mut log = self.log.lock().ok()?;

        let now = Instant::now();
        let phase_elapsed = now.duration_since(log.last_mark);
        log.last_mark = now;
        log.peak_rss_mb = log.peak_rss_mb.max(rss_mb);
        log.phases.push((phase.to_string(), phase_elapsed));

        Some(ResourceSnapshot {
            phase: phase.to_string(),
            cpu_percent,
            rss_mb,
            peak_rss_mb: log.peak_rss_mb,
            phase_elapsed,
            total_elapsed: now.duration_since(self.started),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(snapshot) = self.snapshot(phase) {
            tracing::info!(
                "📊 {} took {:?} - CPU: {:.1}%, Memory: {}MB (peak {}MB)",
                snapshot.phase,
                snapshot.phase_elapsed,
                snapshot.cpu_percent,
                snapshot.rss_mb,
                snapshot.peak_rss_mb
            );
        }
    }

    /// One line with the total time, the peak memory and each phase's share.
    pub fn log_summary(&self) {
        if self.process.is_none() {
            return;
        }
        let Ok(log) = self.log.lock() else {
            return;
        };

        let breakdown: Vec<String> = log
            .phases
            .iter()
            .map(|(phase, elapsed)| format!("{} {:?}", phase, elapsed))
            .collect();
        tracing::info!(
            "📊 Run took {:?}, peak memory {}MB [{}]",
            self.started.elapsed(),
            log.peak_rss_mb,
            breakdown.join(", ")
        );
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Library-only builds carry no sysinfo.
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn snapshot(&self, _phase: &str) -> Option<ResourceSnapshot> {
        None
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_summary(&self) {}
}
