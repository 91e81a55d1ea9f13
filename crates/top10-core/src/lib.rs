pub mod app_config;
pub mod config;
pub mod countries;
pub mod rankings;
pub mod runs;
pub mod validation;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use countries::{default_countries, load_countries, parse_countries, TrackedCountry};
pub use rankings::{
    collapse_duplicate_keys, Category, CategoryRanking, RankingEntry, RankingKey, Source,
    MAX_ENTRIES, MAX_RANK, MIN_RANK,
};
pub use runs::{source_label, RunRecord, RunStatus};
pub use validation::{
    validate, RejectedRanking, RejectionReason, ValidationError, ValidationReport,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read countries file {path}: {source}")]
    CountriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse countries file: {0}")]
    CountriesFileParse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
