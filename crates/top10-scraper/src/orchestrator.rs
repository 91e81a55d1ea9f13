use std::time::Duration;

use top10_core::{AppConfig, CategoryRanking, Source};

use crate::bulk::fetch_bulk;
use crate::client::Top10Client;
use crate::error::ScraperError;
use crate::per_item::fetch_per_item;
use crate::scope::FetchScope;

/// Where the two ranking sources live and how politely to hit the pages.
#[derive(Debug, Clone)]
pub struct SourceEndpoints {
    pub bulk_url: String,
    pub page_base_url: String,
    pub inter_request_delay: Duration,
}

impl SourceEndpoints {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            bulk_url: config.bulk_url.clone(),
            page_base_url: config.page_base_url.clone(),
            inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
        }
    }
}

/// Rankings from exactly one source, with the non-fatal errors met on the way.
#[derive(Debug)]
pub struct FetchOutcome {
    pub rankings: Vec<CategoryRanking>,
    pub source: Source,
    pub errors: Vec<String>,
}

/// Collects rankings for `scope`, preferring the bulk export.
///
/// The per-item pages are consulted only when the bulk export fails or
/// yields nothing for the tracked pairs. Results are never mixed: the
/// outcome's rankings all come from [`FetchOutcome::source`].
///
/// # Errors
///
/// Returns [`ScraperError::SourcesExhausted`] carrying every recorded error
/// when both sources fail.
pub async fn fetch_current_period(
    client: &Top10Client,
    endpoints: &SourceEndpoints,
    scope: &FetchScope<'_>,
) -> Result<FetchOutcome, ScraperError> {
    let mut errors = Vec::new();

    match fetch_bulk(client, &endpoints.bulk_url, scope).await {
        Ok(export) if !export.rankings.is_empty() => {
            return Ok(FetchOutcome {
                rankings: export.rankings,
                source: Source::Bulk,
                errors: export.warnings,
            });
        }
        Ok(export) => {
            tracing::warn!("bulk source returned no rankings for tracked countries — falling back");
            errors.extend(export.warnings);
            errors.push("bulk source returned no rankings for tracked countries".to_owned());
        }
        Err(e) => {
            tracing::warn!(error = %e, "bulk source failed — falling back to per-item pages");
            errors.push(format!("bulk source failed: {e}"));
        }
    }

    match fetch_per_item(
        client,
        &endpoints.page_base_url,
        scope,
        endpoints.inter_request_delay,
    )
    .await
    {
        Ok(fetch) => {
            errors.extend(fetch.errors);
            Ok(FetchOutcome {
                rankings: fetch.rankings,
                source: Source::PerItem,
                errors,
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "per-item source failed — no rankings collected");
            errors.extend(e.messages());
            Err(ScraperError::SourcesExhausted { errors })
        }
    }
}
