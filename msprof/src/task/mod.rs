//! Collection tasks
//!
//! A task is one collection job bound to a single device or the host. Its
//! lifecycle is Init → Start → Stop → Wait; the [`TaskSupervisor`] owns
//! running tasks and tears them down in reverse start order.

pub mod device;
pub mod host;
pub mod sampler;
pub mod sources;
pub mod supervisor;

pub use device::DeviceTask;
pub use host::HostTask;
pub use supervisor::TaskSupervisor;

use crate::domain::{DeviceId, JobId, TaskError};

pub trait CollectionTask: Send {
    fn job_id(&self) -> &JobId;

    fn device(&self) -> DeviceId;

    /// Prepare the job. `NotSupported` means skip this device.
    ///
    /// # Errors
    /// Configuration unusable for this device or host.
    fn init(&mut self) -> Result<(), TaskError>;

    /// # Errors
    /// Collection could not begin.
    fn start(&mut self) -> Result<(), TaskError>;

    /// Request collection to end without waiting for it.
    ///
    /// # Errors
    /// The underlying channel failed while stopping.
    fn stop(&mut self) -> Result<(), TaskError>;

    /// Block until all workers have quiesced.
    ///
    /// # Errors
    /// A worker failed while draining.
    fn wait(&mut self) -> Result<(), TaskError>;
}
