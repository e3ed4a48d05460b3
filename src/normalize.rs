use chrono::{DateTime, NaiveDate};

use crate::models::{JobListing, RawListing};

/// Turn raw adapter fields into a [`JobListing`].
///
/// Returns `None` when a required field (id, role, url) is missing or blank;
/// partial markup is expected, so callers just drop the row.
pub fn normalize(site: &str, raw: RawListing, location_label: Option<&str>) -> Option<JobListing> {
    let source_id = clean(raw.id)?;
    let role = clean(raw.role)?;
    let url = clean(raw.url)?;

    let location = clean(raw.location)
        .map(|loc| strip_label(&loc, location_label))
        .unwrap_or_default();

    Some(JobListing {
        id: format!("{site}:{source_id}"),
        site: site.to_string(),
        source_id,
        role,
        url,
        location,
        department: clean(raw.department),
        published_at: raw.published_at.as_deref().and_then(parse_date),
        description: None,
    })
}

/// Trim and collapse internal whitespace; blank becomes `None`.
fn clean(value: Option<String>) -> Option<String> {
    let value = value?;
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn strip_label(location: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => location
            .strip_prefix(label)
            .map(|rest| rest.trim_start_matches([':', ' ']).trim().to_string())
            .unwrap_or_else(|| location.to_string()),
        None => location.to_string(),
    }
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawListing {
        RawListing {
            id: Some(" R150234 ".to_string()),
            role: Some("\n  Senior   Platform Engineer \n".to_string()),
            url: Some("https://careers.example.com/job/R150234".to_string()),
            location: Some("Location\n   San Jose, California, United States".to_string()),
            department: Some("   ".to_string()),
            published_at: Some("2024-03-05T10:11:12-05:00".to_string()),
        }
    }

    #[test]
    fn test_trims_and_strips_location_label() {
        let listing = normalize("adobe", raw(), Some("Location")).unwrap();
        assert_eq!(listing.id, "adobe:R150234");
        assert_eq!(listing.role, "Senior Platform Engineer");
        assert_eq!(listing.location, "San Jose, California, United States");
        assert_eq!(listing.department, None);
        assert_eq!(listing.published_at, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(listing.description.is_none());
    }

    #[test]
    fn test_missing_required_field_is_dropped() {
        for strip in 0..3 {
            let mut r = raw();
            match strip {
                0 => r.id = None,
                1 => r.role = Some("   ".to_string()),
                _ => r.url = None,
            }
            assert!(normalize("adobe", r, None).is_none());
        }
    }

    #[test]
    fn test_missing_location_is_empty_not_fatal() {
        let mut r = raw();
        r.location = None;
        let listing = normalize("sony", r, None).unwrap();
        assert_eq!(listing.location, "");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 11, 2);
        assert_eq!(parse_date("2023-11-02"), expected);
        assert_eq!(parse_date("2023-11-02T08:00:00Z"), expected);
        assert_eq!(parse_date("2023-11-02 08:00:00"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }
}
