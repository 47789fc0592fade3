//! # Runner
//!
//! Runs every stage in a fixed order and collects one [`CheckResult`] per
//! stage:
//!
//! 1. `manifest.verify` (unless skipped)
//! 2. `schemas.load`
//! 3. `report.vectors`
//! 4. `presets.bindings`
//!
//! A stage that cannot complete still yields a failing result; the run
//! continues. Only configuration errors (missing root, missing or invalid
//! manifest, unusable schema validation) stop the run, and they are
//! returned as errors so the caller chooses the exit behaviour.

use std::path::PathBuf;

use packcheck_core::{CheckResult, ConfigurationError, PackError, PackLayout, RunReport, Verdict};
use packcheck_pack::{verify_pack, BindingResolver};
use packcheck_schema::{probe, validate_report_vectors, SchemaStore};

/// Stage orchestration for one pack.
#[derive(Debug, Clone)]
pub struct Runner {
    root: PathBuf,
    layout: PackLayout,
    skip_manifest: bool,
}

impl Runner {
    /// Runner for the pack at `root`, verifying the manifest by default.
    pub fn new(root: impl Into<PathBuf>, layout: PackLayout) -> Self {
        Self {
            root: root.into(),
            layout,
            skip_manifest: false,
        }
    }

    /// Skip manifest loading and verification entirely.
    pub fn skip_manifest(mut self, skip: bool) -> Self {
        self.skip_manifest = skip;
        self
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// A [`ConfigurationError`] if the run cannot proceed at all.
    pub fn run(&self) -> Result<RunReport, ConfigurationError> {
        if !self.root.is_dir() {
            return Err(ConfigurationError::PackRootMissing(self.root.clone()));
        }
        probe()?;

        let mut report = RunReport::new();
        if self.skip_manifest {
            tracing::info!("manifest verification skipped");
        } else {
            report.push(self.manifest_stage()?);
        }

        match SchemaStore::load(&self.root, &self.layout) {
            Ok(store) => {
                report.push(store.to_check_result(&self.layout));
                report.push(validate_report_vectors(&self.root, &self.layout, &store));
            }
            Err(e) => {
                let reason = format!("schema discovery failed: {e}");
                report.push(CheckResult::fail(packcheck_schema::store::CHECK_NAME, reason.clone()));
                report.push(CheckResult::fail(packcheck_schema::validate::CHECK_NAME, reason));
            }
        }

        report.push(BindingResolver::new(&self.root, &self.layout).resolve_all().to_check_result());

        for result in report.results() {
            tracing::info!(stage = %result.name, ok = result.ok, "stage complete");
        }
        Ok(report)
    }

    fn manifest_stage(&self) -> Result<CheckResult, ConfigurationError> {
        match verify_pack(&self.root, &self.layout) {
            Ok(outcome) => Ok(outcome.to_check_result()),
            Err(PackError::Configuration(e)) => Err(e),
            Err(e) => Ok(CheckResult::fail(
                packcheck_pack::verify::CHECK_NAME,
                format!("scan failed: {e}"),
            )),
        }
    }
}

/// The verdict of a run, including runs that could not start.
pub fn verdict(outcome: &Result<RunReport, ConfigurationError>) -> Verdict {
    match outcome {
        Ok(report) => report.verdict(),
        Err(_) => Verdict::Misconfig,
    }
}
