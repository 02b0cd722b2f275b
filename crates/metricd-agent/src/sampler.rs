//! Runtime sampler: produces one batch of named readings per poll.

use std::time::Instant;

use metricd_core::Metric;
use sysinfo::{Pid, System};
use tracing::debug;

/// A source of metric batches, polled on the agent's poll interval.
pub trait Sampler: Send {
    fn sample(&mut self) -> Vec<Metric>;
}

/// Samples this process and the host it runs on via `sysinfo`.
///
/// Each batch carries gauges for the current readings, a `PollCount`
/// counter with delta 1, and a `RandomValue` gauge.
pub struct RuntimeSampler {
    system: System,
    pid: Option<Pid>,
    started: Instant,
}

impl RuntimeSampler {
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        Self {
            system: System::new(),
            pid,
            started: Instant::now(),
        }
    }
}

impl Default for RuntimeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RuntimeSampler {
    fn sample(&mut self) -> Vec<Metric> {
        self.system.refresh_memory();
        self.system.refresh_cpu();

        let sys = &self.system;
        let mut batch = vec![
            Metric::gauge("TotalMemory", sys.total_memory() as f64),
            Metric::gauge("UsedMemory", sys.used_memory() as f64),
            Metric::gauge("FreeMemory", sys.free_memory() as f64),
            Metric::gauge("AvailableMemory", sys.available_memory() as f64),
            Metric::gauge("TotalSwap", sys.total_swap() as f64),
            Metric::gauge("UsedSwap", sys.used_swap() as f64),
            Metric::gauge("CPUCount", sys.cpus().len() as f64),
            Metric::gauge("CPUUtilization", sys.global_cpu_info().cpu_usage() as f64),
            Metric::gauge("Uptime", self.started.elapsed().as_secs_f64()),
        ];

        if let Some(pid) = self.pid {
            if self.system.refresh_process(pid) {
                if let Some(process) = self.system.process(pid) {
                    batch.push(Metric::gauge("ProcessResidentMemory", process.memory() as f64));
                    batch.push(Metric::gauge(
                        "ProcessVirtualMemory",
                        process.virtual_memory() as f64,
                    ));
                    batch.push(Metric::gauge("ProcessCPUUsage", process.cpu_usage() as f64));
                }
            }
        }

        batch.push(Metric::counter("PollCount", 1));
        batch.push(Metric::gauge("RandomValue", rand::random::<f64>()));
        // Readings sysinfo cannot compute yet come back as NaN.
        batch.retain(|m| m.gauge_value().is_none_or(f64::is_finite));

        debug!(readings = batch.len(), "runtime sampled");
        batch
    }
}
