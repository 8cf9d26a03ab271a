//! Result-directory record file
//!
//! `<output>/<pid>_output.record` lists, one per line, the result
//! directories created by a run under `<output>`. The launched application
//! appends to it in app mode; system mode appends when it creates its result
//! directory. The owning invocation consumes and deletes it once.

use log::warn;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const OUTPUT_RECORD: &str = "output.record";

/// Files larger than this are not trusted as a record.
pub const RECORD_MAX_LEN: u64 = 2 * 1024 * 1024;

#[must_use]
pub fn record_path(output: &Path, pid: u32) -> PathBuf {
    output.join(format!("{pid}_{OUTPUT_RECORD}"))
}

/// Append one directory name.
///
/// # Errors
/// The record cannot be opened or written.
pub fn append(output: &Path, pid: u32, dir_name: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(record_path(output, pid))?;
    writeln!(file, "{dir_name}")
}

/// Read back the recorded directories as paths under `output`, first
/// occurrence order, duplicates dropped, then delete the record.
///
/// `None` when the record is missing, empty or oversized.
#[must_use]
pub fn take(output: &Path, pid: u32) -> Option<Vec<PathBuf>> {
    let path = record_path(output, pid);
    let meta = fs::metadata(&path).ok()?;
    if meta.len() == 0 || meta.len() > RECORD_MAX_LEN {
        warn!("ignoring record {} of {} bytes", path.display(), meta.len());
        let _ = fs::remove_file(&path);
        return None;
    }
    let text = fs::read_to_string(&path).ok()?;
    if let Err(e) = fs::remove_file(&path) {
        warn!("failed to remove {}: {e}", path.display());
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let dir = output.join(line);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    (!dirs.is_empty()).then_some(dirs)
}
