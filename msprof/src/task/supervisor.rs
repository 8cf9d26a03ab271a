//! Ordered ownership of running collection tasks.

use super::CollectionTask;
use crate::domain::{JobId, TaskError};
use log::{info, warn};
use std::collections::HashMap;

/// Running tasks in start order, plus a job-id index into that list.
#[derive(Default)]
pub struct TaskSupervisor {
    tasks: Vec<Box<dyn CollectionTask>>,
    index: HashMap<JobId, usize>,
}

impl TaskSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Init then Start `task`; on success it is registered as running.
    ///
    /// A task whose Init or Start fails is not registered. At most one task
    /// runs per job id.
    ///
    /// # Errors
    /// [`TaskError::DuplicateJob`] when the job id is already running, else
    /// the task's own Init/Start error, `NotSupported` included.
    pub fn launch(&mut self, mut task: Box<dyn CollectionTask>) -> Result<(), TaskError> {
        if self.index.contains_key(task.job_id()) {
            return Err(TaskError::DuplicateJob { device: task.device(), job_id: task.job_id().to_string() });
        }
        task.init()?;
        if let Err(e) = task.start() {
            // Start may have spun up part of its workers
            if let Err(stop) = task.stop() {
                warn!("{}: stop job {} after failed start: {stop}", task.device(), task.job_id());
            }
            if let Err(wait) = task.wait() {
                warn!("{}: wait job {} after failed start: {wait}", task.device(), task.job_id());
            }
            return Err(e);
        }
        info!("{}: job {} started", task.device(), task.job_id());
        self.index.insert(task.job_id().clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Running task by job id, `None` if unknown.
    #[must_use]
    pub fn get_running_task(&self, job_id: &JobId) -> Option<&dyn CollectionTask> {
        self.index.get(job_id).and_then(|&i| self.tasks.get(i)).map(|task| &**task)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stop then Wait every task, last-started first. Every task is torn down
    /// even if an earlier one fails; the first failure is returned.
    ///
    /// # Errors
    /// First Stop/Wait failure encountered.
    pub fn stop_all(&mut self) -> Result<(), TaskError> {
        let mut first_err = None;
        while let Some(mut task) = self.tasks.pop() {
            let job_id = task.job_id().clone();
            if let Err(e) = task.stop() {
                warn!("{}: stop job {job_id} failed: {e}", task.device());
                first_err.get_or_insert(e);
            }
            if let Err(e) = task.wait() {
                warn!("{}: wait job {job_id} failed: {e}", task.device());
                first_err.get_or_insert(e);
            }
            self.index.remove(&job_id);
            info!("{}: job {job_id} stopped", task.device());
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for TaskSupervisor {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            let _ = self.stop_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceId;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        job_id: JobId,
        log: CallLog,
        fail_start: bool,
    }

    impl Recorder {
        fn boxed(name: &str, log: &CallLog) -> Box<dyn CollectionTask> {
            Box::new(Self { job_id: JobId(name.to_string()), log: Arc::clone(log), fail_start: false })
        }

        fn push(&self, op: &str) {
            self.log.lock().unwrap().push(format!("{op}:{}", self.job_id));
        }
    }

    impl CollectionTask for Recorder {
        fn job_id(&self) -> &JobId {
            &self.job_id
        }
        fn device(&self) -> DeviceId {
            DeviceId(0)
        }
        fn init(&mut self) -> Result<(), TaskError> {
            self.push("init");
            Ok(())
        }
        fn start(&mut self) -> Result<(), TaskError> {
            self.push("start");
            if self.fail_start {
                return Err(TaskError::failed(DeviceId(0), "boom"));
            }
            Ok(())
        }
        fn stop(&mut self) -> Result<(), TaskError> {
            self.push("stop");
            Ok(())
        }
        fn wait(&mut self) -> Result<(), TaskError> {
            self.push("wait");
            Ok(())
        }
    }

    #[test]
    fn test_teardown_is_reverse_start_order() {
        let log = CallLog::default();
        let mut sup = TaskSupervisor::new();
        for name in ["j1", "j2", "j3"] {
            sup.launch(Recorder::boxed(name, &log)).unwrap();
        }
        log.lock().unwrap().clear();

        sup.stop_all().unwrap();
        let calls = log.lock().unwrap().clone();
        assert_eq!(calls, vec!["stop:j3", "wait:j3", "stop:j2", "wait:j2", "stop:j1", "wait:j1"]);
        assert!(sup.is_empty());
    }

    #[test]
    fn test_unknown_job_is_none() {
        let log = CallLog::default();
        let mut sup = TaskSupervisor::new();
        sup.launch(Recorder::boxed("j1", &log)).unwrap();
        assert!(sup.get_running_task(&JobId("j1".to_string())).is_some());
        assert!(sup.get_running_task(&JobId("nope".to_string())).is_none());
        sup.stop_all().unwrap();
        assert!(sup.get_running_task(&JobId("j1".to_string())).is_none());
    }

    #[test]
    fn test_failed_start_is_not_registered() {
        let log = CallLog::default();
        let mut sup = TaskSupervisor::new();
        let task = Box::new(Recorder { job_id: JobId("bad".to_string()), log: Arc::clone(&log), fail_start: true });
        assert!(sup.launch(task).is_err());
        assert!(sup.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["init:bad", "start:bad", "stop:bad", "wait:bad"]);
    }

    #[test]
    fn test_duplicate_job_id_is_rejected_before_init() {
        let log = CallLog::default();
        let mut sup = TaskSupervisor::new();
        sup.launch(Recorder::boxed("j1", &log)).unwrap();
        log.lock().unwrap().clear();

        let err = sup.launch(Recorder::boxed("j1", &log)).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateJob { .. }));
        assert!(!err.is_not_supported());
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(sup.len(), 1);
        assert!(sup.get_running_task(&JobId("j1".to_string())).is_some());
        sup.stop_all().unwrap();
    }
}
