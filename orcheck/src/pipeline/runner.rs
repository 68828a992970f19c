use std::collections::BTreeMap;
use std::path::Path;

use crate::api::types::{ObservationEntry, ReportSummary, TimeBudgetReport, ValidationReport};
use crate::error::{CheckError, CheckResult};
use crate::models::{Catalog, ObsId, Observation};
use crate::parsing::CatalogLoader;
use crate::pipeline::checksum::snapshot_checksum;
use crate::pipeline::config::CheckConfig;
use crate::services::aggregation::{BudgetEntry, Exclusion, TimeAggregator, TimeBudget};
use crate::services::approval::ApprovalTracker;
use crate::services::chains::ChainBuilder;
use crate::services::geometry::{ApproximateSunGeometry, PitchGeometry};
use crate::services::pitch::PitchRollComputer;
use crate::services::validation::{
    ConstraintValidator, IssueCategory, ObservationCheck, ValidationIssue, ValidationStatus,
};

/// Per-observation results of the parallelizable stages.
type Evaluation = (ObservationCheck, Result<BudgetEntry, Exclusion>);

/// Main checking pipeline
///
/// Runs load, chain building, validation, aggregation and approval tracking
/// over one OR list and assembles a [`ValidationReport`].
pub struct Pipeline<'g> {
    config: CheckConfig,
    geometry: &'g dyn PitchGeometry,
}

impl Default for Pipeline<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline<'static> {
    /// Create a pipeline with default configuration and the approximate sun
    /// geometry
    pub fn new() -> Self {
        Self::with_config(CheckConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: CheckConfig) -> Self {
        Self {
            config,
            geometry: &ApproximateSunGeometry,
        }
    }
}

impl<'g> Pipeline<'g> {
    /// Replace the pitch geometry.
    pub fn with_geometry<'h>(self, geometry: &'h dyn PitchGeometry) -> Pipeline<'h> {
        Pipeline {
            config: self.config,
            geometry,
        }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check an OR list file.
    pub fn run_file(&self, path: &Path) -> CheckResult<ValidationReport> {
        let text = std::fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.run_str(&text)
    }

    /// Check OR list text.
    ///
    /// # Errors
    ///
    /// Structural errors (malformed records, duplicate obsids, cycles) and
    /// configuration errors abort the run. Everything else is reported.
    pub fn run_str(&self, text: &str) -> CheckResult<ValidationReport> {
        let catalog = CatalogLoader::load_str(text)?;
        let checksum = snapshot_checksum(text, &self.config);
        self.run_catalog(&catalog, checksum)
    }

    /// Check an already loaded catalog.
    pub fn run_catalog(&self, catalog: &Catalog, checksum: String) -> CheckResult<ValidationReport> {
        let reference_days = self.config.reference_days()?;
        let aggregation_day = self.config.aggregation_day()?;
        let reference_roll = self.config.roll.reference_roll;

        let chains = ChainBuilder::new()
            .with_anchor_floor(self.config.chains.anchor_obsid_floor)
            .build(catalog)?;

        let computer = PitchRollComputer::new(self.geometry)
            .with_search_step(self.config.roll.search_step_deg)
            .with_acceptable_zones(self.config.roll.acceptable_zones.clone());
        let placements = self.config.placements();
        let validator = ConstraintValidator::new(&computer, catalog, &placements, &reference_days)
            .with_segment_tolerance(self.config.tolerances.segment_seconds);
        let aggregator =
            TimeAggregator::new(&computer, aggregation_day).with_reference_roll(reference_roll);

        let evaluate = |obs: &Observation| -> Evaluation {
            (validator.validate(obs), aggregator.entry(obs))
        };
        let mut evaluations = if self.config.run.parallel && catalog.len() > 1 {
            evaluate_parallel(catalog, self.config.worker_count(), &evaluate)
        } else {
            catalog
                .observations
                .iter()
                .map(|(obsid, obs)| (*obsid, evaluate(obs)))
                .collect()
        };
        log::info!("evaluated {} observations", evaluations.len());

        for notice in &chains.warnings {
            if let Some((check, _)) = evaluations.get_mut(&notice.obsid) {
                check.issues.push(ValidationIssue::warning(
                    IssueCategory::Chain,
                    "Chain reference",
                    notice.message.clone(),
                ));
            }
        }
        for notice in &chains.info {
            if let Some((check, _)) = evaluations.get_mut(&notice.obsid) {
                check.issues.push(ValidationIssue::info(
                    IssueCategory::Chain,
                    "Chain anchor",
                    notice.message.clone(),
                ));
            }
        }

        let mut entries = Vec::with_capacity(evaluations.len());
        let mut excluded = Vec::new();
        let mut observations = Vec::with_capacity(evaluations.len());
        for (obsid, (check, budget)) in evaluations {
            match budget {
                Ok(entry) => entries.push(entry),
                Err(exclusion) => excluded.push(exclusion),
            }
            if let Some(obs) = catalog.get(obsid) {
                observations.push(ObservationEntry::from_check(obs, check, chains.position(obsid)));
            }
        }
        let budget = TimeBudget::from_entries(entries, excluded);
        log::info!(
            "aggregated {:.0} s over {} observations at day {} ({} excluded)",
            budget.total_seconds,
            budget.included,
            aggregation_day,
            budget.excluded_count()
        );
        let approval = ApprovalTracker::summarize(catalog);

        let mut notices = catalog.notices.clone();
        for stale in &approval.stale_entries {
            notices.push(format!(
                "approval ledger names obsid {} which is not in this list",
                stale
            ));
        }
        for obsid in placements.keys().filter(|id| !catalog.contains(**id)) {
            notices.push(format!("placement for obsid {} which is not in this list", obsid));
        }

        let summary = summarize(&observations, chains.chains.len());
        log::info!(
            "{} observations: {} valid, {} with warnings, {} with errors",
            summary.observations,
            summary.valid,
            summary.warnings,
            summary.errors
        );

        Ok(ValidationReport {
            checksum,
            reference_days: reference_days.iter().map(|d| d.value()).collect(),
            summary,
            observations,
            chains: chains.chains.iter().map(Into::into).collect(),
            time_budget: TimeBudgetReport::from_budget(&budget, aggregation_day, reference_roll),
            approval: (&approval).into(),
            notices,
            comments: catalog
                .comment_text()
                .into_iter()
                .map(|(key, lines)| (key.to_string(), lines))
                .collect(),
        })
    }
}

/// Evaluate observations on scoped threads, one contiguous chunk per worker.
///
/// Results are keyed by obsid, so the merged map does not depend on which
/// worker finished first.
fn evaluate_parallel<F>(
    catalog: &Catalog,
    workers: usize,
    evaluate: &F,
) -> BTreeMap<ObsId, Evaluation>
where
    F: Fn(&Observation) -> Evaluation + Sync,
{
    let observations: Vec<&Observation> = catalog.observations.values().collect();
    let chunk_size = observations.len().div_ceil(workers.max(1)).max(1);
    log::debug!(
        "evaluating {} observations on {} workers",
        observations.len(),
        observations.len().div_ceil(chunk_size)
    );

    std::thread::scope(|scope| {
        let handles: Vec<_> = observations
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&obs| (obs.obsid, evaluate(obs)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut merged = BTreeMap::new();
        for handle in handles {
            match handle.join() {
                Ok(results) => merged.extend(results),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        merged
    })
}

fn summarize(observations: &[ObservationEntry], chains: usize) -> ReportSummary {
    let mut summary = ReportSummary {
        observations: observations.len(),
        chains,
        ..ReportSummary::default()
    };
    for entry in observations {
        match entry.status {
            ValidationStatus::Valid => summary.valid += 1,
            ValidationStatus::Warning => summary.warnings += 1,
            ValidationStatus::Error => summary.errors += 1,
        }
    }
    summary
}
