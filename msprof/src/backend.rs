//! Analysis backend command lines
//!
//! Post-processing is done by `msprof.py`, run as
//! `<python> <script> <subcommand> -dir=<result dir> [flags]`.

use crate::params::{ExportType, ProfileParams};
use crate::preflight::AnalysisEnv;
use std::path::Path;
use std::process::Command;

/// Rule analyzed when `--rule` is not given.
pub const DEFAULT_RULE: &str = "communication";

/// One backend run: a name for diagnostics and its argv after the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    fn new(name: &'static str, args: Vec<String>) -> Self {
        Self { name, args }
    }

    #[must_use]
    pub fn to_command(&self, env: &AnalysisEnv) -> Command {
        let mut cmd = Command::new(&env.python);
        cmd.arg(&env.script).args(&self.args);
        cmd
    }
}

fn dir_arg(dir: &Path) -> String {
    format!("-dir={}", dir.display())
}

#[must_use]
pub fn parse(dir: &Path) -> Invocation {
    Invocation::new("Parse", vec!["import".to_string(), dir_arg(dir)])
}

#[must_use]
pub fn query(dir: &Path) -> Invocation {
    Invocation::new("Query", vec!["query".to_string(), dir_arg(dir)])
}

/// `export db`, or `export timeline` followed by `export summary`.
#[must_use]
pub fn export(dir: &Path, params: &ProfileParams) -> Vec<Invocation> {
    if params.export_type == ExportType::Db {
        return vec![Invocation::new(
            "Export db",
            vec!["export".to_string(), "db".to_string(), dir_arg(dir)],
        )];
    }

    let mut timeline = vec!["export".to_string(), "timeline".to_string(), dir_arg(dir)];
    push_ids(&mut timeline, params);
    if let Some(reports) = &params.reports {
        timeline.push(format!("-reports={}", reports.display()));
    }

    let mut summary = vec![
        "export".to_string(),
        "summary".to_string(),
        dir_arg(dir),
        format!("--format={}", params.summary_format),
    ];
    if params.clear {
        summary.push("--clear".to_string());
    }
    push_ids(&mut summary, params);

    vec![Invocation::new("Export timeline", timeline), Invocation::new("Export summary", summary)]
}

#[must_use]
pub fn analyze(dir: &Path, params: &ProfileParams) -> Invocation {
    let rule = params.rule.as_deref().unwrap_or(DEFAULT_RULE);
    let mut args = vec!["analyze".to_string(), dir_arg(dir), format!("-r={rule}")];
    if params.clear {
        args.push("--clear".to_string());
    }
    if params.export_type == ExportType::Db {
        args.push("--type=db".to_string());
    }
    Invocation::new("Analyze", args)
}

fn push_ids(args: &mut Vec<String>, params: &ProfileParams) {
    if let Some(id) = params.model_id {
        args.push(format!("--model-id={id}"));
    }
    if let Some(id) = params.iteration_id {
        args.push(format!("--iteration-id={id}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SummaryFormat;
    use std::path::PathBuf;

    #[test]
    fn test_export_text_runs_timeline_then_summary() {
        let params = ProfileParams {
            summary_format: SummaryFormat::Json,
            clear: true,
            model_id: Some(1),
            iteration_id: Some(3),
            reports: Some(PathBuf::from("/r.json")),
            ..Default::default()
        };
        let runs = export(Path::new("/out/PROF_1"), &params);
        assert_eq!(runs.len(), 2);
        assert_eq!(
            runs[0].args,
            vec![
                "export",
                "timeline",
                "-dir=/out/PROF_1",
                "--model-id=1",
                "--iteration-id=3",
                "-reports=/r.json"
            ]
        );
        assert_eq!(
            runs[1].args,
            vec![
                "export",
                "summary",
                "-dir=/out/PROF_1",
                "--format=json",
                "--clear",
                "--model-id=1",
                "--iteration-id=3"
            ]
        );
    }

    #[test]
    fn test_export_db_is_single_run() {
        let params = ProfileParams { export_type: ExportType::Db, ..Default::default() };
        let runs = export(Path::new("/d"), &params);
        assert_eq!(runs, vec![Invocation::new("Export db", vec!["export".into(), "db".into(), "-dir=/d".into()])]);
    }

    #[test]
    fn test_analyze_defaults_rule() {
        let params = ProfileParams { export_type: ExportType::Db, ..Default::default() };
        assert_eq!(analyze(Path::new("/d"), &params).args, vec!["analyze", "-dir=/d", "-r=communication", "--type=db"]);
    }

    #[test]
    fn test_parse_uses_import() {
        assert_eq!(parse(Path::new("/d")).args, vec!["import", "-dir=/d"]);
        assert_eq!(query(Path::new("/d")).args, vec!["query", "-dir=/d"]);
    }
}
