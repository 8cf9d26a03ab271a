//! Host statistics sources backed by `/proc`.

use super::sampler::{write_snapshot, SampleSource};
use crate::params::{freq_to_interval_ms, HostSys, ProfileParams};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Default host sampling frequency when no `--host-sys-usage-freq` is given.
const DEFAULT_HOST_FREQ: u32 = 50;

/// Snapshots one `/proc` file per tick.
pub struct ProcFileSource {
    name: String,
    path: PathBuf,
    interval: Duration,
}

impl ProcFileSource {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self { name: name.into(), path: path.into(), interval }
    }

    /// Whole-host source for one statistic. `osrt` is traced by external
    /// tools, not sampled, so it has no `/proc` source.
    #[must_use]
    pub fn host(kind: HostSys, interval: Duration) -> Option<Self> {
        let (name, path) = match kind {
            HostSys::Cpu => ("host_cpu", "/proc/stat"),
            HostSys::Mem => ("host_mem", "/proc/meminfo"),
            HostSys::Disk => ("host_disk", "/proc/diskstats"),
            HostSys::Network => ("host_network", "/proc/net/dev"),
            HostSys::Osrt => return None,
        };
        Some(Self::new(name, path, interval))
    }

    /// Per-process source for `--host-sys-pid`.
    #[must_use]
    pub fn process(pid: u32, interval: Duration) -> Self {
        Self::new(format!("host_pid_{pid}"), format!("/proc/{pid}/stat"), interval)
    }
}

impl SampleSource for ProcFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn sample(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let path = self.path.to_string_lossy();
        write_snapshot(out, &path)
    }
}

/// Sources for a host-only job (`--host-sys` / `--host-sys-usage`).
#[must_use]
pub fn host_sources(params: &ProfileParams) -> Vec<Box<dyn SampleSource>> {
    let freq = params.host_sys_usage_freq.unwrap_or(DEFAULT_HOST_FREQ);
    let interval = Duration::from_millis(u64::from(freq_to_interval_ms(freq)));

    let mut kinds: Vec<HostSys> = params.host_sys.iter().chain(&params.host_sys_usage).copied().collect();
    kinds.sort_unstable();
    kinds.dedup();

    let mut sources: Vec<Box<dyn SampleSource>> = kinds
        .into_iter()
        .filter_map(|kind| ProcFileSource::host(kind, interval))
        .map(|s| Box::new(s) as Box<dyn SampleSource>)
        .collect();
    if let Some(pid) = params.host_sys_pid {
        sources.push(Box::new(ProcFileSource::process(pid, interval)));
    }
    sources
}
