use regex::Regex;

use crate::error::AppError;

/// Country names that disqualify a primary location even when it also
/// mentions the US.
pub const NON_US_COUNTRIES: &[&str] = &[
    "POLAND",
    "CANADA",
    "UK",
    "UNITED KINGDOM",
    "AUSTRALIA",
    "GERMANY",
    "FRANCE",
    "INDIA",
];

/// Separators between locations in a multi-location string. Only the text
/// before the first one decides inclusion.
const DELIMITERS: &[char] = &[':', ';', '|', '\n'];

/// Two-sided geography test: inclusion pattern AND NOT any exclusion.
/// Both sides match whole words on the uppercased primary location.
#[derive(Debug, Clone)]
pub struct GeographyFilter {
    inclusion: Regex,
    exclusion: Option<Regex>,
}

impl GeographyFilter {
    pub fn new<S: AsRef<str>>(inclusion: &str, exclusions: &[S]) -> Result<Self, AppError> {
        let inclusion = Regex::new(inclusion)
            .map_err(|e| AppError::Config(format!("inclusion pattern: {e}")))?;

        let exclusion = if exclusions.is_empty() {
            None
        } else {
            let alternatives = exclusions
                .iter()
                .map(|c| regex::escape(&c.as_ref().to_uppercase()))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"\b(?:{alternatives})\b");
            Some(
                Regex::new(&pattern)
                    .map_err(|e| AppError::Config(format!("exclusion pattern: {e}")))?,
            )
        };

        Ok(Self {
            inclusion,
            exclusion,
        })
    }

    /// `US` as a whole word or `UNITED STATES`, minus [`NON_US_COUNTRIES`].
    pub fn united_states() -> Result<Self, AppError> {
        Self::new(r"\bUS\b|\bUNITED STATES\b", NON_US_COUNTRIES)
    }

    pub fn is_target_geography(&self, location: &str) -> bool {
        let primary = primary_location(location).to_uppercase();
        if !self.inclusion.is_match(&primary) {
            return false;
        }
        match &self.exclusion {
            Some(exclusion) => !exclusion.is_match(&primary),
            None => true,
        }
    }
}

pub fn primary_location(location: &str) -> &str {
    location
        .split(DELIMITERS)
        .next()
        .unwrap_or(location)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn us() -> GeographyFilter {
        GeographyFilter::united_states().unwrap()
    }

    #[test]
    fn test_united_states_remote_is_accepted() {
        assert!(us().is_target_geography("United States, Remote"));
        assert!(us().is_target_geography("San Jose, CA, US"));
        assert!(us().is_target_geography("Remote - US"));
    }

    #[test]
    fn test_non_target_country_without_us_token_is_rejected() {
        let filter = us();
        for location in ["Toronto, Canada", "Bangalore, India", "Warsaw, Poland", "London, UK"] {
            assert!(!filter.is_target_geography(location), "{location}");
        }
    }

    #[test]
    fn test_us_must_be_a_whole_word() {
        let filter = us();
        assert!(!filter.is_target_geography("Belarus"));
        assert!(!filter.is_target_geography("Cyprus, Limassol"));
        assert!(!filter.is_target_geography("Columbus"));
    }

    #[test]
    fn test_multi_region_listing_is_rejected() {
        assert!(!us().is_target_geography("US, Canada, UK"));
    }

    #[test]
    fn test_only_primary_location_governs() {
        let filter = us();
        assert!(filter.is_target_geography("Remote - US: Toronto, Canada"));
        assert!(!filter.is_target_geography("Toronto, Canada: Remote - US"));
    }

    #[test]
    fn test_exclusions_match_whole_words() {
        assert!(us().is_target_geography("Milwaukee, WI, United States"));
    }

    #[test]
    fn test_site_specific_exclusions() {
        let filter = GeographyFilter::new(r"\bUS\b", &["Mexico"]).unwrap();
        assert!(!filter.is_target_geography("US / Mexico"));
        assert!(filter.is_target_geography("New York, US"));
    }

    #[test]
    fn test_empty_location_is_rejected() {
        assert!(!us().is_target_geography(""));
    }
}
