use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A country whose weekly rankings are collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCountry {
    /// ISO 3166-1 alpha-2 code as used by the bulk export, e.g. `"KR"`.
    pub code: String,
    /// Display name, e.g. `"South Korea"`.
    pub name: String,
    /// URL path segment used by the per-item pages, e.g. `"south-korea"`.
    pub slug: String,
}

impl TrackedCountry {
    #[must_use]
    pub fn new(code: &str, name: &str, slug: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }
}

/// The built-in tracked set: 18 countries across Asia, the Americas,
/// Europe and Oceania.
#[must_use]
pub fn default_countries() -> Vec<TrackedCountry> {
    [
        ("KR", "South Korea", "south-korea"),
        ("HK", "Hong Kong", "hong-kong"),
        ("TW", "Taiwan", "taiwan"),
        ("JP", "Japan", "japan"),
        ("TH", "Thailand", "thailand"),
        ("VN", "Vietnam", "vietnam"),
        ("PH", "Philippines", "philippines"),
        ("ID", "Indonesia", "indonesia"),
        ("US", "United States", "united-states"),
        ("CA", "Canada", "canada"),
        ("BR", "Brazil", "brazil"),
        ("MX", "Mexico", "mexico"),
        ("GB", "United Kingdom", "united-kingdom"),
        ("DE", "Germany", "germany"),
        ("FR", "France", "france"),
        ("ES", "Spain", "spain"),
        ("IT", "Italy", "italy"),
        ("AU", "Australia", "australia"),
    ]
    .into_iter()
    .map(|(code, name, slug)| TrackedCountry::new(code, name, slug))
    .collect()
}

#[derive(Debug, Deserialize)]
struct CountriesFile {
    countries: Vec<TrackedCountry>,
}

/// Load and validate a tracked-country override from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_countries(path: &Path) -> Result<Vec<TrackedCountry>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CountriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_countries(&content)
}

/// Parse and validate a tracked-country list from YAML text.
///
/// ```yaml
/// countries:
///   - code: KR
///     name: South Korea
///     slug: south-korea
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_countries(yaml: &str) -> Result<Vec<TrackedCountry>, ConfigError> {
    let file: CountriesFile = serde_yaml::from_str(yaml)?;
    validate_countries(&file.countries)?;
    Ok(file.countries)
}

fn validate_countries(countries: &[TrackedCountry]) -> Result<(), ConfigError> {
    if countries.is_empty() {
        return Err(ConfigError::Validation(
            "at least one tracked country is required".to_string(),
        ));
    }

    let mut seen_codes = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for country in countries {
        if country.code.len() != 2 || !country.code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "country code '{}' must be two uppercase ASCII letters",
                country.code
            )));
        }

        if country.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "country '{}' has an empty name",
                country.code
            )));
        }

        if country.slug.is_empty()
            || !country
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "country '{}' has invalid slug '{}'",
                country.code, country.slug
            )));
        }

        if !seen_codes.insert(country.code.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate country code: '{}'",
                country.code
            )));
        }

        if !seen_slugs.insert(country.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate country slug: '{}'",
                country.slug
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_has_eighteen_valid_countries() {
        let countries = default_countries();
        assert_eq!(countries.len(), 18);
        assert!(validate_countries(&countries).is_ok());
        assert!(countries.iter().any(|c| c.code == "JP" && c.slug == "japan"));
    }

    #[test]
    fn parses_yaml_override() {
        let yaml = "countries:\n  - code: KR\n    name: South Korea\n    slug: south-korea\n  - code: US\n    name: United States\n    slug: united-states\n";
        let countries = parse_countries(yaml).unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[1].name, "United States");
    }

    #[test]
    fn rejects_empty_list() {
        let err = parse_countries("countries: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_lowercase_code() {
        let yaml = "countries:\n  - code: kr\n    name: South Korea\n    slug: south-korea\n";
        let err = parse_countries(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("'kr'")));
    }

    #[test]
    fn rejects_duplicate_code() {
        let yaml = "countries:\n  - code: KR\n    name: South Korea\n    slug: south-korea\n  - code: KR\n    name: Korea\n    slug: korea\n";
        let err = parse_countries(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate country code")));
    }

    #[test]
    fn rejects_slug_with_spaces() {
        let yaml = "countries:\n  - code: US\n    name: United States\n    slug: united states\n";
        assert!(parse_countries(yaml).is_err());
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let err = parse_countries("countries: [").unwrap_err();
        assert!(matches!(err, ConfigError::CountriesFileParse(_)));
    }

    #[test]
    fn shipped_countries_file_matches_defaults() {
        let countries = parse_countries(include_str!("../../../config/countries.yaml")).unwrap();
        assert_eq!(countries, default_countries());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_countries(Path::new("/nonexistent/countries.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::CountriesFileIo { .. }));
    }
}
