//! Per-item ranking pages: one rendered page per (country, category) pair.
//!
//! Pages are parsed through `data-uia` attributes only. Class names on these
//! pages are generated at build time and change between deploys.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use top10_core::{
    Category, CategoryRanking, RankingEntry, RankingKey, Source, TrackedCountry, MAX_ENTRIES,
};

use crate::client::Top10Client;
use crate::error::ScraperError;
use crate::scope::FetchScope;

const CONTEXT: &str = "ranking page";

const ROW_SELECTOR: &str = r#"[data-uia="top10-table"] tbody tr"#;
const RANK_SELECTOR: &str = r#"[data-uia="top10-table-row-rank"]"#;
const TITLE_SELECTOR: &str = r#"[data-uia="top10-table-row-title"]"#;
const WEEKS_SELECTOR: &str = r#"[data-uia="top10-table-row-weeks"]"#;
const WEEK_START_SELECTOR: &str = r#"[data-uia="top10-week-start"]"#;

/// Rankings collected page by page, plus the pairs that could not be read.
#[derive(Debug, Default)]
pub struct PerItemFetch {
    pub rankings: Vec<CategoryRanking>,
    /// One `"{CC}/{category}: {error}"` line per failed pair.
    pub errors: Vec<String>,
}

/// Builds the page URL for one pair.
///
/// Films live at `{base}/{slug}`, TV at `{base}/{slug}/tv`. An explicit
/// period is passed as `?week=YYYY-MM-DD`.
#[must_use]
pub fn page_url(
    base_url: &str,
    country: &TrackedCountry,
    category: Category,
    period: Option<NaiveDate>,
) -> String {
    let mut url = format!("{}/{}", base_url.trim_end_matches('/'), country.slug);
    if category == Category::Tv {
        url.push_str("/tv");
    }
    if let Some(period) = period {
        url.push_str(&format!("?week={}", period.format("%Y-%m-%d")));
    }
    url
}

/// Fetches and parses one page per tracked pair, sequentially, sleeping
/// `delay` between requests.
///
/// A pair that fails to fetch or parse is logged, recorded in
/// [`PerItemFetch::errors`], and skipped.
///
/// # Errors
///
/// Returns [`ScraperError::AllItemsFailed`] when not a single pair succeeded.
pub async fn fetch_per_item(
    client: &Top10Client,
    base_url: &str,
    scope: &FetchScope<'_>,
    delay: Duration,
) -> Result<PerItemFetch, ScraperError> {
    let mut fetch = PerItemFetch::default();
    let mut attempted = 0usize;

    for country in scope.countries {
        for &category in scope.categories {
            if attempted > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempted += 1;

            let url = page_url(base_url, country, category, scope.period);
            let result = match client.fetch_text(&url).await {
                Ok(html) => {
                    parse_ranking_page(&html, country, category, scope.period, Utc::now())
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(ranking) => {
                    tracing::debug!(
                        country = %country.code,
                        %category,
                        entries = ranking.entries().len(),
                        "ranking page parsed"
                    );
                    fetch.rankings.push(ranking);
                }
                Err(e) => {
                    tracing::warn!(
                        country = %country.code,
                        %category,
                        %url,
                        error = %e,
                        "ranking page failed — skipping"
                    );
                    fetch
                        .errors
                        .push(format!("{}/{category}: {e}", country.code));
                }
            }
        }
    }

    if fetch.rankings.is_empty() {
        return Err(ScraperError::AllItemsFailed {
            attempted,
            errors: fetch.errors,
        });
    }

    tracing::info!(
        attempted,
        succeeded = fetch.rankings.len(),
        failed = fetch.errors.len(),
        "per-item fetch complete"
    );
    Ok(fetch)
}

fn parse_error(reason: impl Into<String>) -> ScraperError {
    ScraperError::Parse {
        context: CONTEXT.to_owned(),
        reason: reason.into(),
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid ranking page selector")
}

/// Whitespace-normalized text of the first element under `row` matching `sel`.
fn cell_text(row: ElementRef<'_>, sel: &Selector) -> Option<String> {
    row.select(sel)
        .next()
        .map(|el| el.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
}

/// Parses one rendered ranking page into a [`CategoryRanking`].
///
/// Reads at most [`MAX_ENTRIES`] rows. A missing weeks cell counts as zero
/// weeks. `period` overrides the week printed on the page.
///
/// # Errors
///
/// Returns [`ScraperError::Parse`] when the page has no rows, a row lacks a
/// rank or title, a rank or weeks value is not a number, or no period can
/// be determined.
pub fn parse_ranking_page(
    html: &str,
    country: &TrackedCountry,
    category: Category,
    period: Option<NaiveDate>,
    fetched_at: DateTime<Utc>,
) -> Result<CategoryRanking, ScraperError> {
    let document = Html::parse_document(html);
    let row_sel = selector(ROW_SELECTOR);
    let rank_sel = selector(RANK_SELECTOR);
    let title_sel = selector(TITLE_SELECTOR);
    let weeks_sel = selector(WEEKS_SELECTOR);

    let rows: Vec<ElementRef<'_>> = document.select(&row_sel).take(MAX_ENTRIES).collect();
    if rows.is_empty() {
        return Err(parse_error("no ranking rows"));
    }

    let mut entries = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        let position = idx + 1;
        let rank_text = cell_text(row, &rank_sel)
            .ok_or_else(|| parse_error(format!("row {position}: missing rank")))?;
        let rank = rank_text
            .parse::<u8>()
            .map_err(|_| parse_error(format!("row {position}: invalid rank '{rank_text}'")))?;
        let title = cell_text(row, &title_sel)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| parse_error(format!("row {position}: missing title")))?;
        let weeks_in_top = match cell_text(row, &weeks_sel) {
            Some(text) => text.parse::<u32>().map_err(|_| {
                parse_error(format!("row {position}: invalid weeks in top 10 '{text}'"))
            })?,
            None => 0,
        };
        entries.push(RankingEntry::new(rank, title, weeks_in_top));
    }

    let period = match period {
        Some(period) => period,
        None => page_period(&document)?,
    };

    Ok(CategoryRanking::new(
        RankingKey::new(period, country.code.as_str(), category),
        country.name.as_str(),
        Source::PerItem,
        fetched_at,
        entries,
    ))
}

/// Reads the week-start date from the page's `datetime` attribute, falling
/// back to a `YYYY-MM-DD` date anywhere in the element text.
fn page_period(document: &Html) -> Result<NaiveDate, ScraperError> {
    let date_re = Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date regex");
    let element = document
        .select(&selector(WEEK_START_SELECTOR))
        .next()
        .ok_or_else(|| parse_error("missing week start"))?;

    let text: String = element.text().collect();
    let read_date = |candidate: &str| {
        date_re
            .find(candidate)
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok())
    };

    element
        .value()
        .attr("datetime")
        .and_then(read_date)
        .or_else(|| read_date(&text))
        .ok_or_else(|| parse_error("unreadable week start"))
}

#[cfg(test)]
#[path = "per_item_test.rs"]
mod tests;
