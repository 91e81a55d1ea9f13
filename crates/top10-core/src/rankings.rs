//! Normalized ranking types shared by both data sources.
//!
//! The bulk export and the per-item pages are structurally different, but
//! both produce [`CategoryRanking`] values built from [`RankingEntry`] rows.
//! Values are immutable once built; "corrections" go through the
//! consuming `with_*` methods, which return a new instance.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lowest rank a ranked title can hold.
pub const MIN_RANK: u8 = 1;
/// Highest rank a ranked title can hold.
pub const MAX_RANK: u8 = 10;
/// Maximum number of entries in one ranking.
pub const MAX_ENTRIES: usize = 10;

/// Content category of a ranking list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Films,
    Tv,
}

impl Category {
    /// Both tracked categories, in their canonical order.
    pub const ALL: [Category; 2] = [Category::Films, Category::Tv];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Films => "films",
            Category::Tv => "tv",
        }
    }

    /// Maps a category label as it appears in the bulk export
    /// (`"Films"`, `"TV"`) to a [`Category`].
    #[must_use]
    pub fn from_export_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Films" => Some(Category::Films),
            "TV" => Some(Category::Tv),
            other => other.parse().ok(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "films" | "film" => Ok(Category::Films),
            "tv" => Ok(Category::Tv),
            other => Err(format!("unknown category '{other}'; expected 'films' or 'tv'")),
        }
    }
}

/// Which source produced a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "bulk")]
    Bulk,
    #[serde(rename = "per-item")]
    PerItem,
}

impl Source {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Bulk => "bulk",
            Source::PerItem => "per-item",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked title in a top-10 list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    rank: u8,
    title: String,
    weeks_in_top: u32,
}

impl RankingEntry {
    #[must_use]
    pub fn new(rank: u8, title: impl Into<String>, weeks_in_top: u32) -> Self {
        Self {
            rank,
            title: title.into(),
            weeks_in_top,
        }
    }

    #[must_use]
    pub fn rank(&self) -> u8 {
        self.rank
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Cumulative weeks the title has spent in the top 10.
    #[must_use]
    pub fn weeks_in_top(&self) -> u32 {
        self.weeks_in_top
    }
}

/// Compound identity of a ranking document: `(period, country, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RankingKey {
    pub period: NaiveDate,
    /// ISO 3166-1 alpha-2 country code, e.g. `"KR"`.
    pub country: String,
    pub category: Category,
}

impl RankingKey {
    #[must_use]
    pub fn new(period: NaiveDate, country: impl Into<String>, category: Category) -> Self {
        Self {
            period,
            country: country.into(),
            category,
        }
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.country, self.category, self.period)
    }
}

/// The top-10 list for one country, one category and one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRanking {
    period: NaiveDate,
    country: String,
    country_name: String,
    category: Category,
    fetched_at: DateTime<Utc>,
    source: Source,
    entries: Vec<RankingEntry>,
}

impl CategoryRanking {
    #[must_use]
    pub fn new(
        key: RankingKey,
        country_name: impl Into<String>,
        source: Source,
        fetched_at: DateTime<Utc>,
        entries: Vec<RankingEntry>,
    ) -> Self {
        Self {
            period: key.period,
            country: key.country,
            country_name: country_name.into(),
            category: key.category,
            fetched_at,
            source,
            entries,
        }
    }

    #[must_use]
    pub fn key(&self) -> RankingKey {
        RankingKey::new(self.period, self.country.clone(), self.category)
    }

    #[must_use]
    pub fn period(&self) -> NaiveDate {
        self.period
    }

    #[must_use]
    pub fn country(&self) -> &str {
        &self.country
    }

    #[must_use]
    pub fn country_name(&self) -> &str {
        &self.country_name
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    #[must_use]
    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    /// Returns a copy of this ranking attributed to `source`.
    #[must_use]
    pub fn with_source(self, source: Source) -> Self {
        Self { source, ..self }
    }
}

/// Collapses rankings that share a [`RankingKey`], keeping the last-seen
/// value in the position where the key first appeared.
#[must_use]
pub fn collapse_duplicate_keys(rankings: Vec<CategoryRanking>) -> Vec<CategoryRanking> {
    let mut positions: HashMap<RankingKey, usize> = HashMap::with_capacity(rankings.len());
    let mut collapsed: Vec<CategoryRanking> = Vec::with_capacity(rankings.len());

    for ranking in rankings {
        let key = ranking.key();
        if let Some(&idx) = positions.get(&key) {
            collapsed[idx] = ranking;
        } else {
            positions.insert(key, collapsed.len());
            collapsed.push(ranking);
        }
    }

    collapsed
}
