//! Process liveness and naming via `/proc`.

use anyhow::{bail, Context, Result};
use std::fs;

/// Whether `/proc/<pid>` describes a live (non-zombie) process.
#[must_use]
pub fn process_exists(pid: u32) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // Zombies keep their /proc entry until reaped
    !matches!(extract_state(&stat), Some('Z' | 'X'))
}

/// Command name of a running process, from `/proc/<pid>/stat`.
///
/// # Errors
/// Returns error if the process doesn't exist or its stat line is malformed.
pub fn process_name(pid: u32) -> Result<String> {
    let stat_path = format!("/proc/{pid}/stat");
    let stat = fs::read_to_string(&stat_path).with_context(|| format!("Cannot read {stat_path}"))?;
    extract_comm(&stat)
}

/// Extract command name from `/proc/<pid>/stat`.
/// Format: "pid (comm) state ..."
pub(crate) fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

fn extract_state(stat_line: &str) -> Option<char> {
    let close = stat_line.rfind(')')?;
    stat_line[close + 1..].trim_start().chars().next()
}
