//! Host-side collection task.

use super::sampler::{SampleSource, Sampler};
use super::CollectionTask;
use crate::domain::{DeviceId, JobId, TaskError};
use crate::layout;
use log::{debug, warn};
use std::path::PathBuf;

/// Samples host statistics into `<job_dir>/data` and records the job
/// configuration as `sample.json`.
pub struct HostTask {
    job_id: JobId,
    device: DeviceId,
    job_dir: PathBuf,
    blob: String,
    pending: Vec<Box<dyn SampleSource>>,
    samplers: Vec<Sampler>,
}

impl HostTask {
    #[must_use]
    pub fn new(
        job_id: JobId,
        device: DeviceId,
        job_dir: PathBuf,
        blob: String,
        sources: Vec<Box<dyn SampleSource>>,
    ) -> Self {
        Self { job_id, device, job_dir, blob, pending: sources, samplers: Vec::new() }
    }
}

impl CollectionTask for HostTask {
    fn job_id(&self) -> &JobId {
        &self.job_id
    }

    fn device(&self) -> DeviceId {
        self.device
    }

    fn init(&mut self) -> Result<(), TaskError> {
        std::fs::create_dir_all(&self.job_dir)?;
        layout::write_sample_json(&self.job_dir, &self.blob)?;
        debug!("{}: host job {} in {}", self.device, self.job_id, self.job_dir.display());
        Ok(())
    }

    fn start(&mut self) -> Result<(), TaskError> {
        for source in self.pending.drain(..) {
            let sampler = Sampler::spawn(source, &self.job_dir)?;
            debug!("{}: started sampler {}", self.device, sampler.name());
            self.samplers.push(sampler);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TaskError> {
        for sampler in &mut self.samplers {
            sampler.stop();
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<(), TaskError> {
        let mut first_err = None;
        for mut sampler in self.samplers.drain(..) {
            if let Err(e) = sampler.wait() {
                warn!("{}: sampler {} failed: {e}", self.device, sampler.name());
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(TaskError::Io(e)),
            None => Ok(()),
        }
    }
}
