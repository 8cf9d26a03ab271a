//! Offline modes: parse, query, export and analyze existing results.

use super::runner::Runner;
use super::{sets, ModeContext};
use crate::domain::{ModeError, RunStatus};
use crate::params::{ExportType, ProfileParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineMode {
    Parse,
    Query,
    Export,
    Analyze,
}

impl OfflineMode {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OfflineMode::Parse => "parse",
            OfflineMode::Query => "query",
            OfflineMode::Export => "export",
            OfflineMode::Analyze => "analyze",
        }
    }

    fn param_sets(self, params: &ProfileParams) -> sets::ParamSets {
        match self {
            OfflineMode::Parse => sets::PARSE,
            OfflineMode::Query => sets::QUERY,
            OfflineMode::Export if params.export_type == ExportType::Db => sets::EXPORT_DB,
            OfflineMode::Export => sets::EXPORT,
            OfflineMode::Analyze => sets::ANALYZE,
        }
    }
}

pub(crate) fn check(mode: OfflineMode, params: &ProfileParams) -> Result<(), ModeError> {
    let sets = mode.param_sets(params);
    sets.check_forbidden(&params.used_params)?;
    sets.check_necessary(&params.used_params)?;
    sets.warn_useless(&params.used_params);
    Ok(())
}

pub(crate) fn run(mode: OfflineMode, params: &ProfileParams, ctx: &ModeContext) -> Result<RunStatus, ModeError> {
    let mut runner = Runner::new(ctx, mode.name());
    runner.check_analysis_env(params)?;
    runner.update_dirs_from_params(params);
    for dir in runner.result_dirs().to_vec() {
        match mode {
            OfflineMode::Parse => {
                runner.start_parse(&dir, params)?;
                runner.start_query(&dir, params)?;
            }
            OfflineMode::Query => runner.start_query(&dir, params)?,
            OfflineMode::Export => runner.start_export(&dir, params)?,
            OfflineMode::Analyze => runner.start_analyze(&dir, params)?,
        }
    }
    Ok(RunStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArgId;

    #[test]
    fn test_export_db_uses_narrow_set() {
        let mut params = ProfileParams { export_type: ExportType::Db, ..Default::default() };
        params.used_params.extend([ArgId::Output, ArgId::Export, ArgId::ExportType, ArgId::ModelId]);
        let err = check(OfflineMode::Export, &params).unwrap_err();
        assert_eq!(err.to_string(), "The argument --model-id is forbidden when --export and --type is not empty");

        params.export_type = ExportType::Text;
        assert!(check(OfflineMode::Export, &params).is_ok());
    }

    #[test]
    fn test_parse_requires_output() {
        let mut params = ProfileParams::default();
        params.used_params.insert(ArgId::Parse);
        assert!(matches!(check(OfflineMode::Parse, &params), Err(ModeError::MissingNecessary { .. })));
    }
}
