//! Result directory naming and per-job files.

use crate::domain::JobId;
use chrono::{DateTime, Local};
use rand::Rng;
use std::fs;
use std::io;
use std::path::Path;

const SAMPLE_JSON: &str = "sample.json";
const DONE_SUFFIX: &str = ".done";
const SUFFIX_LEN: usize = 8;

/// `PROF_000001_<YYYYMMDDhhmmssmmm>_<pid:08><8 chars A..=R>`.
#[must_use]
pub fn result_dir_name(pid: u32, now: DateTime<Local>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN).map(|_| char::from(rng.gen_range(b'A'..=b'R'))).collect();
    format!("PROF_000001_{}_{pid:08}{suffix}", now.format("%Y%m%d%H%M%S%3f"))
}

/// Fresh random job id, `trace` + 20 digits.
#[must_use]
pub fn new_job_id() -> JobId {
    JobId(format!("trace{:020}", rand::thread_rng().gen::<u64>()))
}

/// Write `sample.json` and its `sample.json.done` size marker.
///
/// # Errors
/// Either file cannot be written.
pub fn write_sample_json(job_dir: &Path, blob: &str) -> io::Result<()> {
    let path = job_dir.join(SAMPLE_JSON);
    fs::write(&path, blob)?;
    fs::write(job_dir.join(format!("{SAMPLE_JSON}{DONE_SUFFIX}")), format!("filesize: {}\n", blob.len()))
}
