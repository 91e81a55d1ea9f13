//! Structural validation of normalized rankings before persistence.
//!
//! A [`CategoryRanking`] is accepted or rejected as a whole. Every rule that
//! fails contributes its own [`RejectionReason`], so a rejected ranking
//! reports all of its problems at once rather than the first one found.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::rankings::{CategoryRanking, RankingKey, MAX_ENTRIES, MAX_RANK, MIN_RANK};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("no ranking entries")]
    NoEntries,

    #[error("{count} entries exceeds the maximum of {max}", max = MAX_ENTRIES)]
    TooManyEntries { count: usize },

    #[error("rank {rank} out of range [{min}-{max}]", min = MIN_RANK, max = MAX_RANK)]
    RankOutOfRange { rank: u8 },

    #[error("duplicate rank {rank}")]
    DuplicateRank { rank: u8 },

    #[error("empty title at rank {rank}")]
    BlankTitle { rank: u8 },

    #[error("duplicate title \"{title}\"")]
    DuplicateTitle { title: String },

    #[error("rank {rank} listed after rank {previous}")]
    OutOfOrder { rank: u8, previous: u8 },
}

/// A ranking excluded from persistence, with every reason it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRanking {
    pub key: RankingKey,
    pub reasons: Vec<RejectionReason>,
}

impl fmt::Display for RejectedRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.key)?;
        for (i, reason) in self.reasons.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{reason}")?;
        }
        Ok(())
    }
}

/// Every ranking rejected by one [`validate`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} ranking(s) rejected by validation", .rejected.len())]
pub struct ValidationError {
    pub rejected: Vec<RejectedRanking>,
}

/// Outcome of validating a batch: accepted rankings keep their input order.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub accepted: Vec<CategoryRanking>,
    pub rejected: Vec<RejectedRanking>,
}

impl ValidationReport {
    /// Returns the rejections as an error, or `None` if everything passed.
    #[must_use]
    pub fn error(&self) -> Option<ValidationError> {
        if self.rejected.is_empty() {
            None
        } else {
            Some(ValidationError {
                rejected: self.rejected.clone(),
            })
        }
    }

    /// One human-readable line per rejected ranking, e.g.
    /// `"validation rejected KR/tv/2026-02-01: duplicate rank 1"`.
    #[must_use]
    pub fn rejection_messages(&self) -> Vec<String> {
        self.rejected
            .iter()
            .map(|r| format!("validation rejected {r}"))
            .collect()
    }
}

/// Checks a single ranking and returns every rule it violates.
///
/// An empty vector means the ranking is valid.
#[must_use]
pub fn check_ranking(ranking: &CategoryRanking) -> Vec<RejectionReason> {
    let entries = ranking.entries();
    if entries.is_empty() {
        return vec![RejectionReason::NoEntries];
    }

    let mut reasons = Vec::new();

    if entries.len() > MAX_ENTRIES {
        reasons.push(RejectionReason::TooManyEntries {
            count: entries.len(),
        });
    }

    let mut seen_ranks: HashSet<u8> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut previous: Option<u8> = None;

    for entry in entries {
        let rank = entry.rank();

        if !(MIN_RANK..=MAX_RANK).contains(&rank) {
            reasons.push(RejectionReason::RankOutOfRange { rank });
        }

        if !seen_ranks.insert(rank) {
            reasons.push(RejectionReason::DuplicateRank { rank });
        }

        if let Some(prev) = previous {
            if rank < prev {
                reasons.push(RejectionReason::OutOfOrder {
                    rank,
                    previous: prev,
                });
            }
        }
        previous = Some(rank);

        let title = entry.title().trim();
        if title.is_empty() {
            reasons.push(RejectionReason::BlankTitle { rank });
        } else if !seen_titles.insert(title.to_lowercase()) {
            reasons.push(RejectionReason::DuplicateTitle {
                title: title.to_string(),
            });
        }
    }

    reasons
}

/// Validates a batch of rankings, splitting them into accepted and rejected.
///
/// Short lists (fewer than ten entries) are unusual but legitimate and only
/// produce a warning.
#[must_use]
pub fn validate(rankings: Vec<CategoryRanking>) -> ValidationReport {
    let mut report = ValidationReport::default();

    for ranking in rankings {
        let reasons = check_ranking(&ranking);
        if reasons.is_empty() {
            if ranking.entries().len() < MAX_ENTRIES {
                tracing::warn!(
                    key = %ranking.key(),
                    entries = ranking.entries().len(),
                    "ranking has fewer than {MAX_ENTRIES} entries"
                );
            }
            report.accepted.push(ranking);
        } else {
            report.rejected.push(RejectedRanking {
                key: ranking.key(),
                reasons,
            });
        }
    }

    if !report.rejected.is_empty() {
        tracing::warn!(
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "validation rejected some rankings"
        );
    }

    report
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
