use std::time::Duration;

use crate::countries::TrackedCountry;
use crate::rankings::Category;
use crate::ConfigError;

#[derive(Clone)]
pub struct AppConfig {
    /// Validated when set; only commands that touch Postgres require it.
    pub database_url: Option<String>,
    pub log_level: String,
    pub countries: Vec<TrackedCountry>,
    pub categories: Vec<Category>,
    pub bulk_url: String,
    pub page_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
    pub run_budget_secs: u64,
    pub schedule: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// Returns the database URL, or an error naming the missing variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// Number of page requests the per-item source issues for one run.
    #[must_use]
    pub fn per_item_request_count(&self) -> usize {
        self.countries.len() * self.categories.len()
    }

    /// Wall-clock upper bound of the per-item source when every request
    /// runs to its timeout on the first attempt.
    #[must_use]
    pub fn per_item_worst_case(&self) -> Duration {
        let per_request = Duration::from_secs(self.request_timeout_secs)
            + Duration::from_millis(self.inter_request_delay_ms);
        per_request.saturating_mul(u32::try_from(self.per_item_request_count()).unwrap_or(u32::MAX))
    }

    /// Returns `true` when the per-item worst case does not fit in the run budget.
    #[must_use]
    pub fn exceeds_run_budget(&self) -> bool {
        self.per_item_worst_case() > Duration::from_secs(self.run_budget_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let codes: Vec<&str> = self.countries.iter().map(|c| c.code.as_str()).collect();
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("countries", &codes)
            .field("categories", &self.categories)
            .field("bulk_url", &self.bulk_url)
            .field("page_base_url", &self.page_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("run_budget_secs", &self.run_budget_secs)
            .field("schedule", &self.schedule)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
