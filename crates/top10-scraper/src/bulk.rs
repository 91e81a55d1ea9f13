//! Bulk ranking export: one tab-separated download covering every country,
//! category, and week the provider has published.
//!
//! Only the rows for the selected period and the tracked country/category
//! pairs survive parsing. The selected period is the latest week present in
//! the export unless the caller pins one explicitly.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord};
use top10_core::{Category, CategoryRanking, RankingEntry, RankingKey, Source, MAX_RANK, MIN_RANK};

use crate::client::Top10Client;
use crate::error::ScraperError;
use crate::scope::FetchScope;

const CONTEXT: &str = "bulk export";
const WEEK_FORMAT: &str = "%Y-%m-%d";
/// Placeholder the export uses for films, which have no season.
const NO_SEASON: &str = "N/A";

/// Parsed result of a bulk download.
#[derive(Debug, Default)]
pub struct BulkExport {
    pub rankings: Vec<CategoryRanking>,
    /// Row-level problems that excluded individual rows.
    pub warnings: Vec<String>,
}

/// Downloads and parses the bulk export at `url`.
///
/// # Errors
///
/// Returns any transport error from [`Top10Client::fetch_text`], or the
/// whole-payload errors documented on [`parse_bulk_export`].
pub async fn fetch_bulk(
    client: &Top10Client,
    url: &str,
    scope: &FetchScope<'_>,
) -> Result<BulkExport, ScraperError> {
    let text = client.fetch_text(url).await?;
    tracing::debug!(url, bytes = text.len(), "bulk export downloaded");
    let export = parse_bulk_export(&text, scope, Utc::now())?;
    tracing::info!(
        rankings = export.rankings.len(),
        warnings = export.warnings.len(),
        "bulk export parsed"
    );
    Ok(export)
}

/// Column positions resolved from the header row.
struct Columns {
    country: usize,
    week: usize,
    category: usize,
    rank: usize,
    show_title: usize,
    season_title: Option<usize>,
    weeks_in_top: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ScraperError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ScraperError::Parse {
                context: CONTEXT.to_owned(),
                reason: format!("missing required column '{name}'"),
            })
        };

        Ok(Self {
            country: require("country_iso2")?,
            week: require("week")?,
            category: require("category")?,
            rank: require("weekly_rank")?,
            show_title: require("show_title")?,
            season_title: find("season_title"),
            weeks_in_top: require("cumulative_weeks_in_top_10")?,
        })
    }
}

/// A row for a tracked pair in the selected period, not yet validated.
struct PendingRow {
    line: u64,
    rank: String,
    title: String,
    weeks_in_top: String,
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

/// Parses a bulk export body into one ranking per tracked pair.
///
/// Rows for other periods, untracked countries, or untracked categories are
/// dropped silently. Rows with an invalid rank, a duplicate rank, a missing
/// title, or an invalid weeks count are dropped and reported in
/// [`BulkExport::warnings`]. Pairs left with no rows produce no ranking.
///
/// # Errors
///
/// - [`ScraperError::EmptyPayload`] if `text` is blank.
/// - [`ScraperError::Parse`] if the header row is unreadable or lacks a
///   required column.
pub fn parse_bulk_export(
    text: &str,
    scope: &FetchScope<'_>,
    fetched_at: DateTime<Utc>,
) -> Result<BulkExport, ScraperError> {
    if text.trim().is_empty() {
        return Err(ScraperError::EmptyPayload {
            context: CONTEXT.to_owned(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| ScraperError::Parse {
            context: CONTEXT.to_owned(),
            reason: e.to_string(),
        })?
        .clone();
    let columns = Columns::locate(&headers)?;

    let mut warnings = Vec::new();
    let mut selected = scope.period;
    // Keyed by (country index, category index) so output follows tracked order.
    let mut groups: BTreeMap<(usize, usize), Vec<PendingRow>> = BTreeMap::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warnings.push(format!("{CONTEXT}: unreadable row: {e}"));
                continue;
            }
        };
        let line = record.position().map_or(0, csv::Position::line);

        let country_idx = scope
            .countries
            .iter()
            .position(|c| c.code == cell(&record, columns.country));
        let category_idx = Category::from_export_label(cell(&record, columns.category))
            .and_then(|category| scope.categories.iter().position(|c| *c == category));
        let tracked = country_idx.zip(category_idx);

        let raw_week = cell(&record, columns.week);
        let Ok(week) = NaiveDate::parse_from_str(raw_week, WEEK_FORMAT) else {
            if tracked.is_some() {
                warnings.push(format!("{CONTEXT} line {line}: unparseable week '{raw_week}'"));
            }
            continue;
        };

        // Latest-period selection is independent of row order: a newer week
        // discards everything kept so far.
        if scope.period.is_none() && selected.is_none_or(|current| week > current) {
            selected = Some(week);
            groups.clear();
        }
        if Some(week) != selected {
            continue;
        }
        let Some(pair) = tracked else {
            continue;
        };

        let season_title = columns
            .season_title
            .map(|idx| cell(&record, idx))
            .filter(|s| !s.is_empty() && *s != NO_SEASON);
        let title = season_title.unwrap_or_else(|| cell(&record, columns.show_title));

        groups.entry(pair).or_default().push(PendingRow {
            line,
            rank: cell(&record, columns.rank).to_owned(),
            title: title.to_owned(),
            weeks_in_top: cell(&record, columns.weeks_in_top).to_owned(),
        });
    }

    let Some(period) = selected else {
        return Ok(BulkExport {
            rankings: Vec::new(),
            warnings,
        });
    };

    let mut rankings = Vec::with_capacity(groups.len());
    for ((country_idx, category_idx), rows) in groups {
        let country = &scope.countries[country_idx];
        let key = RankingKey::new(period, country.code.as_str(), scope.categories[category_idx]);
        let entries = build_entries(&key, rows, &mut warnings);
        if entries.is_empty() {
            continue;
        }
        rankings.push(CategoryRanking::new(
            key,
            country.name.as_str(),
            Source::Bulk,
            fetched_at,
            entries,
        ));
    }

    Ok(BulkExport { rankings, warnings })
}

/// Validates the rows of one pair and returns its entries ordered by rank.
fn build_entries(
    key: &RankingKey,
    rows: Vec<PendingRow>,
    warnings: &mut Vec<String>,
) -> Vec<RankingEntry> {
    let mut parsed: Vec<(u64, RankingEntry)> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(rank) = row
            .rank
            .parse::<u8>()
            .ok()
            .filter(|r| (MIN_RANK..=MAX_RANK).contains(r))
        else {
            warnings.push(format!("{key} line {}: invalid rank '{}'", row.line, row.rank));
            continue;
        };
        if row.title.is_empty() {
            warnings.push(format!("{key} line {}: missing title at rank {rank}", row.line));
            continue;
        }
        let Ok(weeks_in_top) = row.weeks_in_top.parse::<u32>() else {
            warnings.push(format!(
                "{key} line {}: invalid weeks in top 10 '{}'",
                row.line, row.weeks_in_top
            ));
            continue;
        };
        parsed.push((row.line, RankingEntry::new(rank, row.title, weeks_in_top)));
    }

    // Stable sort keeps file order within a rank, so the first row wins.
    parsed.sort_by_key(|(_, entry)| entry.rank());

    let mut entries: Vec<RankingEntry> = Vec::with_capacity(parsed.len());
    for (line, entry) in parsed {
        if entries.last().is_some_and(|prev| prev.rank() == entry.rank()) {
            warnings.push(format!("{key} line {line}: duplicate rank {}", entry.rank()));
            continue;
        }
        entries.push(entry);
    }
    entries
}

#[cfg(test)]
#[path = "bulk_test.rs"]
mod tests;
