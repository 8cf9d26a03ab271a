//! Device driver seam
//!
//! The accelerator driver (device enumeration, device-side collection
//! channels) is an external collaborator. [`Driver`] is the narrow interface
//! msprof needs from it; [`HostDriver`] is the implementation for a host
//! without a linked driver library, and tests substitute fakes.

use crate::domain::{DeviceId, TaskError};
use crate::params::ProfileParams;
use crate::task::sampler::SampleSource;
use crate::task::sources::ProcFileSource;
use std::path::PathBuf;
use std::time::Duration;

/// Device-side collection channel for one device.
pub trait DeviceSession: Send {
    /// Hand the serialized configuration to the device and begin collection.
    ///
    /// # Errors
    /// The device rejected the configuration or the channel failed.
    fn start(&mut self, blob: &str) -> Result<(), TaskError>;

    /// # Errors
    /// The channel failed while stopping.
    fn stop(&mut self) -> Result<(), TaskError>;

    /// Block until the device has flushed its data.
    ///
    /// # Errors
    /// The channel failed while draining.
    fn wait(&mut self) -> Result<(), TaskError>;
}

pub trait Driver: Send + Sync {
    /// Devices currently online, in enumeration order.
    ///
    /// # Errors
    /// The driver could not be queried.
    fn online_devices(&self) -> Result<Vec<u32>, TaskError>;

    /// Host-side sources for a device job.
    fn host_sources(&self, device: DeviceId, params: &ProfileParams) -> Vec<Box<dyn SampleSource>>;

    /// Open the device-side collection channel.
    ///
    /// # Errors
    /// [`TaskError::NotSupported`] when the environment cannot reach the
    /// device (e.g. inside a container), otherwise [`TaskError::Failed`].
    fn open_session(&self, device: DeviceId) -> Result<Box<dyn DeviceSession>, TaskError>;
}

/// Driver backed by the host's device nodes.
pub struct HostDriver {
    dev_root: PathBuf,
    in_container: bool,
}

impl HostDriver {
    #[must_use]
    pub fn new(in_container: bool) -> Self {
        Self::with_dev_root("/dev", in_container)
    }

    #[must_use]
    pub fn with_dev_root(dev_root: impl Into<PathBuf>, in_container: bool) -> Self {
        Self { dev_root: dev_root.into(), in_container }
    }
}

impl Driver for HostDriver {
    fn online_devices(&self) -> Result<Vec<u32>, TaskError> {
        let entries = std::fs::read_dir(&self.dev_root)?;
        let mut ids: Vec<u32> = entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().and_then(parse_davinci))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn host_sources(&self, device: DeviceId, params: &ProfileParams) -> Vec<Box<dyn SampleSource>> {
        // Device jobs keep a host-side view of the sampled process
        let Some(pid) = params.host_sys_pid else {
            log::debug!("{device}: no host-side sources");
            return Vec::new();
        };
        let freq = params.sys_pid_sampling_freq.unwrap_or(1);
        let interval = Duration::from_millis(u64::from(crate::params::freq_to_interval_ms(freq)));
        vec![Box::new(ProcFileSource::process(pid, interval))]
    }

    fn open_session(&self, device: DeviceId) -> Result<Box<dyn DeviceSession>, TaskError> {
        if self.in_container {
            return Err(TaskError::not_supported(
                device,
                "device-side system profiling is not supported in a container",
            ));
        }
        Err(TaskError::not_supported(device, "the device collection channel is not available"))
    }
}

/// `davinci<N>` device node to `N`. Management nodes (`davinci_manager`) are skipped.
fn parse_davinci(name: &str) -> Option<u32> {
    name.strip_prefix("davinci")?.parse().ok()
}
