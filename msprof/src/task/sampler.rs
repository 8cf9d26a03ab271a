//! Periodic sampling worker.
//!
//! One thread per [`SampleSource`]. The thread waits on a stop channel with a
//! timeout equal to the sampling interval; every timeout takes one snapshot
//! and appends it to `<job_dir>/data/<source>.data`.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Something that can be snapshotted periodically.
pub trait SampleSource: Send {
    /// File stem of the data file.
    fn name(&self) -> &str;

    /// Sampling interval.
    fn interval(&self) -> Duration;

    /// Append one snapshot to `out`.
    ///
    /// # Errors
    /// I/O failures reading the source or writing the snapshot.
    fn sample(&mut self, out: &mut dyn Write) -> io::Result<()>;
}

pub struct Sampler {
    name: String,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<io::Result<u64>>>,
}

impl Sampler {
    /// Open the data file and start sampling.
    ///
    /// # Errors
    /// The data directory or file cannot be created, or the thread cannot spawn.
    pub fn spawn(mut source: Box<dyn SampleSource>, job_dir: &Path) -> io::Result<Self> {
        let data_dir = job_dir.join("data");
        fs::create_dir_all(&data_dir)?;
        let name = source.name().to_string();
        let file = OpenOptions::new().create(true).append(true).open(data_dir.join(format!("{name}.data")))?;
        let interval = source.interval();

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new().name(format!("sampler-{name}")).spawn(move || {
            let mut out = BufWriter::new(file);
            let mut samples = 0u64;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        source.sample(&mut out)?;
                        samples += 1;
                    }
                    // Stop requested, or the owner went away
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            out.flush()?;
            Ok(samples)
        })?;

        Ok(Self { name, stop_tx: Some(stop_tx), handle: Some(handle) })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the worker to stop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Block until the worker has flushed and exited.
    ///
    /// # Errors
    /// The worker failed to sample or write, or panicked.
    pub fn wait(&mut self) -> io::Result<()> {
        self.stop();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(Ok(samples)) => {
                debug!("sampler {} finished with {samples} samples", self.name);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::other(format!("sampler {} panicked", self.name))),
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.wait() {
                warn!("sampler {} stopped with error: {e}", self.name);
            }
        }
    }
}

/// Write the whole of `src` into `out` as one timestamped snapshot.
pub(crate) fn write_snapshot(out: &mut dyn Write, src: &str) -> io::Result<()> {
    let text = fs::read_to_string(src)?;
    let ts = chrono::Local::now().timestamp_micros();
    writeln!(out, "time {ts}")?;
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counter {
        hits: Arc<AtomicUsize>,
    }

    impl SampleSource for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn interval(&self) -> Duration {
            Duration::from_millis(5)
        }

        fn sample(&mut self, out: &mut dyn Write) -> io::Result<()> {
            let n = self.hits.fetch_add(1, Ordering::SeqCst);
            writeln!(out, "{n}")
        }
    }

    #[test]
    fn test_sampler_writes_until_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sampler =
            Sampler::spawn(Box::new(Counter { hits: Arc::clone(&hits) }), dir.path()).unwrap();
        while hits.load(Ordering::SeqCst) < 3 {
            thread::sleep(Duration::from_millis(5));
        }
        sampler.wait().unwrap();

        let after = hits.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(hits.load(Ordering::SeqCst), after, "no samples after wait");

        let data = fs::read_to_string(dir.path().join("data/counter.data")).unwrap();
        assert_eq!(data.lines().count(), after);
    }
}
