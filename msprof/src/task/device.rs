//! Device-side (RPC) collection task.

use super::CollectionTask;
use crate::domain::{DeviceId, JobId, TaskError};
use crate::driver::{DeviceSession, Driver};
use std::sync::Arc;

pub struct DeviceTask {
    job_id: JobId,
    device: DeviceId,
    driver: Arc<dyn Driver>,
    blob: String,
    session: Option<Box<dyn DeviceSession>>,
    started: bool,
}

impl DeviceTask {
    #[must_use]
    pub fn new(job_id: JobId, device: DeviceId, driver: Arc<dyn Driver>, blob: String) -> Self {
        Self { job_id, device, driver, blob, session: None, started: false }
    }
}

impl CollectionTask for DeviceTask {
    fn job_id(&self) -> &JobId {
        &self.job_id
    }

    fn device(&self) -> DeviceId {
        self.device
    }

    fn init(&mut self) -> Result<(), TaskError> {
        if self.device.is_host() {
            return Err(TaskError::failed(self.device, "device task requires a device id"));
        }
        self.session = Some(self.driver.open_session(self.device)?);
        Ok(())
    }

    fn start(&mut self) -> Result<(), TaskError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| TaskError::failed(self.device, "device task started before init"))?;
        session.start(&self.blob)?;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TaskError> {
        match self.session.as_mut() {
            Some(session) if self.started => session.stop(),
            _ => Ok(()),
        }
    }

    fn wait(&mut self) -> Result<(), TaskError> {
        let result = match self.session.as_mut() {
            Some(session) if self.started => session.wait(),
            _ => Ok(()),
        };
        self.started = false;
        self.session = None;
        result
    }
}
