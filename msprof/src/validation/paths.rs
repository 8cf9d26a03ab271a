//! Filesystem-facing option checks: output root, application, python path,
//! reports file and the application environment.

use crate::domain::{ArgId, ValidationError};
use crate::preflight::{is_executable, is_writable};
use msprof_common::ASCEND_WORK_PATH_ENV;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_PATH_LENGTH: usize = 4096;
pub const MAX_APP_LEN: usize = 1024;

/// Output subdirectory created under `$ASCEND_WORK_PATH`.
pub const PROFILING_RESULT_PATH: &str = "profiling_data";

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}

/// Create (if needed) and canonicalize a writable output directory.
///
/// # Errors
/// Empty, too long, uncreatable, not a directory, unwritable, or not
/// canonicalizable.
pub fn output_dir(arg: ArgId, raw: &str) -> Result<PathBuf, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(arg));
    }
    let path = absolute(Path::new(raw));
    if path.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(ValidationError::path(
            arg,
            raw,
            format!("exceeds the maximum length of {MAX_PATH_LENGTH}"),
        ));
    }
    fs::create_dir_all(&path)
        .map_err(|e| ValidationError::path(arg, raw, format!("create output dir failed: {e}")))?;
    if !path.is_dir() {
        return Err(ValidationError::path(arg, raw, "is not a dir"));
    }
    if !is_writable(&path) {
        return Err(ValidationError::path(arg, raw, "permission denied"));
    }
    fs::canonicalize(&path)
        .map_err(|e| ValidationError::path(arg, raw, format!("cannot get the canonicalized path: {e}")))
}

/// Output root when `--output` is absent: `$ASCEND_WORK_PATH/profiling_data`,
/// else the current directory if an application is launched.
///
/// # Errors
/// The work-path directory cannot be prepared.
pub fn default_output_root(has_app: bool) -> Result<Option<PathBuf>, ValidationError> {
    if let Some(work) = std::env::var_os(ASCEND_WORK_PATH_ENV).filter(|v| !v.is_empty()) {
        let root = absolute(Path::new(&work)).join(PROFILING_RESULT_PATH);
        return output_dir(ArgId::Output, &root.to_string_lossy()).map(Some);
    }
    if has_app {
        let cwd = std::env::current_dir()
            .and_then(fs::canonicalize)
            .map_err(|e| ValidationError::path(ArgId::Output, ".", e.to_string()))?;
        return Ok(Some(cwd));
    }
    Ok(None)
}

/// A resolved application command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSpec {
    /// What gets executed: the binary, or the script interpreter.
    pub program: PathBuf,
    pub parameters: Vec<String>,
    /// Base name of the profiled binary or script.
    pub name: String,
}

/// Shells and python interpreters run a script rather than being the
/// profiled application themselves.
fn is_interpreter(cmd: &str) -> bool {
    let base = base_name(cmd);
    base == "bash" || base == "sh" || base.starts_with("python")
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn valid_app_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}

/// Resolve `--application "<cmd> [params]"`.
///
/// # Errors
/// See [`application_argv`]; also rejects an overlong command line.
pub fn application(raw: &str) -> Result<AppSpec, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty(ArgId::Application));
    }
    if raw.len() > MAX_APP_LEN {
        return Err(ValidationError::invalid(
            ArgId::Application,
            raw,
            format!("Expected param length less than {MAX_APP_LEN}"),
        ));
    }
    let argv: Vec<String> = raw.split_whitespace().map(String::from).collect();
    application_argv(&argv)
}

/// Resolve an application given as argv (`msprof [opts] ./app args..`).
///
/// A binary must be an executable, non-symlink regular file with a plain
/// name. An interpreter must be on `PATH` or an executable path, and its
/// first operand must be an existing, non-symlink script.
///
/// # Errors
/// [`ValidationError`] naming the failing path.
pub fn application_argv(argv: &[String]) -> Result<AppSpec, ValidationError> {
    let Some((cmd, rest)) = argv.split_first() else {
        return Err(ValidationError::Empty(ArgId::Application));
    };
    let arg = ArgId::Application;

    if is_interpreter(cmd) {
        let program = if cmd.contains('/') {
            let path = absolute(Path::new(cmd));
            if fs::canonicalize(&path).is_err() {
                return Err(ValidationError::path(arg, cmd, "does not exist or permission denied"));
            }
            if !is_executable(&path) {
                return Err(ValidationError::path(arg, cmd, "has no executable permission"));
            }
            path
        } else {
            PathBuf::from(cmd)
        };
        let script = rest
            .first()
            .ok_or_else(|| ValidationError::invalid(arg, cmd, "Expected one script"))?;
        let script_path = absolute(Path::new(script));
        if fs::canonicalize(&script_path).is_err() {
            return Err(ValidationError::path(arg, script, "script does not exist or permission denied"));
        }
        if is_symlink(&script_path) {
            return Err(ValidationError::path(arg, script, "script is a soft link"));
        }
        return Ok(AppSpec {
            program,
            parameters: rest.to_vec(),
            name: base_name(script).to_string(),
        });
    }

    let path = absolute(Path::new(cmd));
    let name = base_name(cmd);
    if !valid_app_name(name) {
        return Err(ValidationError::invalid(arg, cmd, "App name may only contain letters, digits, '_', '-' and '.'"));
    }
    if fs::canonicalize(&path).is_err() {
        return Err(ValidationError::path(arg, cmd, "does not exist or permission denied"));
    }
    if is_symlink(&path) {
        return Err(ValidationError::path(arg, cmd, "is a soft link, which is not supported"));
    }
    if path.is_dir() {
        return Err(ValidationError::path(arg, cmd, "is a directory, please enter the executable file path"));
    }
    if !is_executable(&path) {
        return Err(ValidationError::path(arg, cmd, "has no executable permission"));
    }
    Ok(AppSpec { program: path, parameters: rest.to_vec(), name: name.to_string() })
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// `--python-path`: an existing executable file.
///
/// # Errors
/// Empty, too long, missing, not executable or a directory.
pub fn python_path(raw: &str) -> Result<String, ValidationError> {
    let arg = ArgId::PythonPath;
    if raw.is_empty() {
        return Err(ValidationError::Empty(arg));
    }
    if raw.len() > MAX_PATH_LENGTH {
        return Err(ValidationError::path(arg, raw, format!("exceeds the maximum length of {MAX_PATH_LENGTH}")));
    }
    let path = fs::canonicalize(raw)
        .map_err(|_| ValidationError::path(arg, raw, "does not exist or permission denied"))?;
    if path.is_dir() {
        return Err(ValidationError::path(arg, raw, "is a directory, please enter the executable file path"));
    }
    if !is_executable(&path) {
        return Err(ValidationError::path(arg, raw, "permission denied"));
    }
    Ok(raw.to_string())
}

/// `--reports`: an existing readable file.
///
/// # Errors
/// Missing or not a regular file.
pub fn reports(raw: &str) -> Result<PathBuf, ValidationError> {
    let arg = ArgId::Reports;
    if raw.is_empty() {
        return Err(ValidationError::Empty(arg));
    }
    let path = fs::canonicalize(raw)
        .map_err(|_| ValidationError::path(arg, raw, "does not exist or permission denied"))?;
    if !path.is_file() {
        return Err(ValidationError::path(arg, raw, "is not a file"));
    }
    fs::File::open(&path).map_err(|e| ValidationError::path(arg, raw, e.to_string()))?;
    Ok(path)
}

/// `--environment`: `K=V` pairs separated by `;`.
///
/// # Errors
/// Empty value or a pair without `=`.
pub fn environment(raw: &str) -> Result<Vec<(String, String)>, ValidationError> {
    let arg = ArgId::Environment;
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty(arg));
    }
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(ValidationError::invalid(arg, raw, format!("Expected KEY=VALUE, got {pair}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn make_exec(path: &Path) {
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_output_dir_is_created_and_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("a/../b");
        let out = output_dir(ArgId::Output, raw.to_str().unwrap()).unwrap();
        assert_eq!(out, fs::canonicalize(dir.path().join("b")).unwrap());
    }

    #[test]
    fn test_output_dir_rejects_file_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(output_dir(ArgId::Output, file.to_str().unwrap()).is_err());
        assert!(matches!(output_dir(ArgId::Output, ""), Err(ValidationError::Empty(_))));
        let long = "x".repeat(MAX_PATH_LENGTH + 1);
        assert!(output_dir(ArgId::Output, &long).is_err());
    }

    #[test]
    fn test_application_binary_with_params() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("my_app");
        make_exec(&app);
        let spec = application(&format!("{} --batch 8", app.display())).unwrap();
        assert_eq!(spec.program, app);
        assert_eq!(spec.parameters, vec!["--batch", "8"]);
        assert_eq!(spec.name, "my_app");
    }

    #[test]
    fn test_application_rejects_non_executable_and_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("data.txt");
        fs::write(&plain, "").unwrap();
        assert!(application(plain.to_str().unwrap()).is_err());

        let app = dir.path().join("app");
        make_exec(&app);
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&app, &link).unwrap();
        let err = application(link.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("soft link"));

        assert!(application("/nonexistent/app").is_err());
    }

    #[test]
    fn test_interpreter_validates_script_operand() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("train.sh");
        fs::write(&script, "exit 0\n").unwrap();
        let spec = application(&format!("bash {} --epochs 1", script.display())).unwrap();
        assert_eq!(spec.program, PathBuf::from("bash"));
        assert_eq!(spec.name, "train.sh");
        assert_eq!(spec.parameters.len(), 3);

        assert!(application("python3").is_err());
        assert!(application("sh /nonexistent/run.sh").is_err());
    }

    #[test]
    fn test_python_path_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let py = dir.path().join("python");
        make_exec(&py);
        assert!(python_path(py.to_str().unwrap()).is_ok());
        assert!(python_path(dir.path().to_str().unwrap()).is_err());

        let rep = dir.path().join("reports.json");
        fs::write(&rep, "{}").unwrap();
        assert_eq!(reports(rep.to_str().unwrap()).unwrap(), fs::canonicalize(&rep).unwrap());
        assert!(reports(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_environment_pairs() {
        let env = environment("A=1; B=x=y").unwrap();
        assert_eq!(env, vec![("A".into(), "1".into()), ("B".into(), "x=y".into())]);
        assert!(environment("NOEQUALS").is_err());
        assert!(environment(" ").is_err());
    }
}
