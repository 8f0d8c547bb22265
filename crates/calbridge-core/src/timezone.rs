use crate::error::CoreError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| {
        CoreError::InvalidTimezone(format!(
            "'{}'. Use IANA timezone names like 'America/New_York'",
            timezone
        ))
    })
}

/// Detect system timezone
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    tracing::debug!("could not detect system timezone, falling back to UTC");
    "UTC".to_string()
}

/// The given zone if valid, the system zone if absent.
pub fn resolve_timezone(timezone: Option<&str>) -> Result<String, CoreError> {
    match timezone {
        Some(tz) => validate_timezone(tz).map(|_| tz.to_string()),
        None => Ok(detect_system_timezone()),
    }
}

/// Format datetime with timezone-aware display
pub fn format_with_timezone(
    datetime: DateTime<Utc>,
    timezone: &str,
    format: &str,
) -> Result<String, CoreError> {
    let tz = validate_timezone(timezone)?;
    Ok(datetime.with_timezone(&tz).format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());
        assert!(validate_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(resolve_timezone(Some("Europe/Berlin")).unwrap(), "Europe/Berlin");
        assert!(resolve_timezone(Some("Mars/Olympus")).is_err());
        assert!(validate_timezone(&resolve_timezone(None).unwrap()).is_ok());
    }

    #[test]
    fn test_format_with_timezone() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_with_timezone(dt, "Asia/Tokyo", "%Y-%m-%d %H:%M").unwrap(),
            "2025-01-01 21:00"
        );
    }
}
