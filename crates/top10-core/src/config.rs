use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::countries::{default_countries, load_countries};
use crate::rankings::Category;
use crate::ConfigError;

const DEFAULT_BULK_URL: &str = "https://www.netflix.com/tudum/top10/data/all-weeks-countries.tsv";
const DEFAULT_PAGE_BASE_URL: &str = "https://www.netflix.com/tudum/top10";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set value is invalid or the countries file cannot be loaded.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a set value is invalid or the countries file cannot be loaded.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup; no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = lookup("DATABASE_URL").ok();
    if let Some(url) = &database_url {
        validate_database_url(url)?;
    }

    let log_level = or_default("TOP10_LOG_LEVEL", "info");

    let countries = match lookup("TOP10_COUNTRIES_PATH") {
        Ok(path) => load_countries(&PathBuf::from(path))?,
        Err(_) => default_countries(),
    };
    let categories = parse_categories(&or_default("TOP10_CATEGORIES", "films,tv"))?;

    let bulk_url = or_default("TOP10_BULK_URL", DEFAULT_BULK_URL);
    let page_base_url = or_default("TOP10_PAGE_BASE_URL", DEFAULT_PAGE_BASE_URL);

    let request_timeout_secs = parse_u64("TOP10_REQUEST_TIMEOUT_SECS", "20")?;
    let user_agent = or_default("TOP10_USER_AGENT", "top10-collector/0.1");
    let max_retries = parse_u32("TOP10_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("TOP10_RETRY_BACKOFF_BASE_MS", "1000")?;
    let inter_request_delay_ms = parse_u64("TOP10_INTER_REQUEST_DELAY_MS", "1500")?;
    let run_budget_secs = parse_u64("TOP10_RUN_BUDGET_SECS", "900")?;
    let schedule = or_default("TOP10_SCHEDULE", "0 0 12 * * TUE");

    let db_max_connections = parse_u32("TOP10_DB_MAX_CONNECTIONS", "1")?;
    let db_min_connections = parse_u32("TOP10_DB_MIN_CONNECTIONS", "0")?;
    let db_acquire_timeout_secs = parse_u64("TOP10_DB_ACQUIRE_TIMEOUT_SECS", "5")?;

    Ok(AppConfig {
        database_url,
        log_level,
        countries,
        categories,
        bulk_url,
        page_base_url,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        inter_request_delay_ms,
        run_budget_secs,
        schedule,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a comma-separated category list such as `"films,tv"`.
///
/// Duplicates are dropped, first occurrence wins.
fn parse_categories(raw: &str) -> Result<Vec<Category>, ConfigError> {
    let mut categories = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let category = part
            .parse::<Category>()
            .map_err(|reason| ConfigError::InvalidEnvVar {
                var: "TOP10_CATEGORIES".to_string(),
                reason,
            })?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    if categories.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "TOP10_CATEGORIES".to_string(),
            reason: "at least one category is required".to_string(),
        });
    }

    Ok(categories)
}

fn validate_database_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar {
            var: "DATABASE_URL".to_string(),
            reason: "expected a postgres:// or postgresql:// connection string".to_string(),
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
