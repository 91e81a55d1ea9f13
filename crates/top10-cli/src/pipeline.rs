//! One collection invocation: fetch, validate, persist, audit.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use top10_core::{validate, AppConfig, RunRecord, RunStatus};
use top10_db::RankingStore;
use top10_scraper::{fetch_current_period, FetchScope, SourceEndpoints, Top10Client};
use uuid::Uuid;

/// What an invocation reports back to its trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct InvocationResult {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub source_used: &'static str,
    pub saved: u64,
    pub errors: Vec<String>,
}

impl From<&RunRecord> for InvocationResult {
    fn from(run: &RunRecord) -> Self {
        Self {
            run_id: run.run_id,
            status: run.status,
            source_used: run.source_label(),
            saved: run.documents_saved,
            errors: run.errors.clone(),
        }
    }
}

/// Runs the pipeline once against `store`.
///
/// Never fails: every error is folded into the returned result and into the
/// run record written to `store`. A failure to write that record is logged
/// and otherwise ignored.
pub(crate) async fn run_pipeline<S: RankingStore>(
    config: &AppConfig,
    client: &Top10Client,
    store: &S,
    period: Option<NaiveDate>,
) -> InvocationResult {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, ?period, "collection run started");

    if config.exceeds_run_budget() {
        tracing::warn!(
            worst_case_secs = config.per_item_worst_case().as_secs(),
            budget_secs = config.run_budget_secs,
            "per-item fallback may not finish within the run budget"
        );
    }

    let scope = FetchScope::new(&config.countries, &config.categories).with_period(period);
    let endpoints = SourceEndpoints::from_config(config);

    let mut errors = Vec::new();
    let mut source_used = None;
    let mut saved = 0;

    match fetch_current_period(client, &endpoints, &scope).await {
        Ok(outcome) => {
            source_used = Some(outcome.source);
            errors.extend(outcome.errors);

            let report = validate(outcome.rankings);
            errors.extend(report.rejection_messages());

            if report.accepted.is_empty() {
                tracing::error!(
                    rejected = report.rejected.len(),
                    "no rankings passed validation — nothing to save"
                );
                errors.push("no rankings passed validation".to_owned());
            } else {
                match store.save(&report.accepted).await {
                    Ok(count) => saved = count,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to save rankings");
                        errors.push(format!("storage failed: {e}"));
                    }
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "collection failed: no source produced rankings");
            errors.extend(e.messages());
        }
    }

    let record = RunRecord::finish(run_id, started_at, source_used, saved, errors);
    if let Err(e) = store.record_run(&record).await {
        tracing::error!(%run_id, error = %e, "failed to record run");
    }

    tracing::info!(
        %run_id,
        status = %record.status,
        source = record.source_label(),
        saved = record.documents_saved,
        errors = record.errors.len(),
        "collection run complete"
    );
    InvocationResult::from(&record)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
