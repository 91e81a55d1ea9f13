use chrono::NaiveDate;
use top10_core::{Category, TrackedCountry};

/// The set of rankings one run asks the sources for.
#[derive(Debug, Clone, Copy)]
pub struct FetchScope<'a> {
    pub countries: &'a [TrackedCountry],
    pub categories: &'a [Category],
    /// Explicit period to collect. `None` means the most recent one available.
    pub period: Option<NaiveDate>,
}

impl<'a> FetchScope<'a> {
    #[must_use]
    pub fn new(countries: &'a [TrackedCountry], categories: &'a [Category]) -> Self {
        Self {
            countries,
            categories,
            period: None,
        }
    }

    #[must_use]
    pub fn with_period(mut self, period: Option<NaiveDate>) -> Self {
        self.period = period;
        self
    }

    /// Number of (country, category) pairs in scope.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.countries.len() * self.categories.len()
    }
}
