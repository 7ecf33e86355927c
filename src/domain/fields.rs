//! Parsing and validation rules for user-submitted menu and news fields.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::error::DomainError;

/// Trim a required text field, rejecting blank input.
pub fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Collapse blank optional text to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Parse a price submitted as text; fractional parts are truncated.
pub fn parse_price(raw: &str) -> Result<i32, DomainError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("price `{}` is not a number", raw.trim())))?;
    price_from_number(value)
}

/// Validate a numeric price, truncating toward zero.
pub fn price_from_number(value: f64) -> Result<i32, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::validation("price must be a finite number"));
    }
    let truncated = value.trunc();
    if truncated < 0.0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    if truncated > f64::from(i32::MAX) {
        return Err(DomainError::validation("price is too large"));
    }
    Ok(truncated as i32)
}

/// Parse an optional calorie count; blank input means "not specified".
pub fn parse_calories(raw: Option<&str>) -> Result<Option<i32>, DomainError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let calories: i32 = raw
        .parse()
        .map_err(|_| DomainError::validation(format!("calories `{raw}` is not an integer")))?;
    validate_calories(Some(calories))
}

pub fn validate_calories(calories: Option<i32>) -> Result<Option<i32>, DomainError> {
    match calories {
        Some(value) if value < 0 => Err(DomainError::validation("calories must not be negative")),
        other => Ok(other),
    }
}

/// Parse the RFC 3339 publish timestamp of a news post.
///
/// Past timestamps are accepted as-is; publishing dates are not enforced.
pub fn parse_posted_at(raw: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|err| {
        DomainError::validation(format!("postedAt `{}` is not RFC 3339: {err}", raw.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn price_truncates_decimals() {
        assert_eq!(parse_price("150").expect("price"), 150);
        assert_eq!(parse_price(" 199.99 ").expect("price"), 199);
        assert_eq!(price_from_number(0.5).expect("price"), 0);
    }

    #[test]
    fn price_rejects_garbage_and_negatives() {
        assert!(parse_price("cheap").is_err());
        assert!(parse_price("").is_err());
        assert!(parse_price("-5").is_err());
        assert!(price_from_number(f64::NAN).is_err());
        assert!(price_from_number(1e12).is_err());
    }

    #[test]
    fn calories_are_optional() {
        assert_eq!(parse_calories(None).expect("calories"), None);
        assert_eq!(parse_calories(Some("  ")).expect("calories"), None);
        assert_eq!(parse_calories(Some("320")).expect("calories"), Some(320));
        assert!(parse_calories(Some("lots")).is_err());
        assert!(parse_calories(Some("-1")).is_err());
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", "  Latte ").expect("title"), "Latte");
        let err = required_text("title", " \t").expect_err("blank title");
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" Foamy ")), Some("Foamy".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn posted_at_accepts_past_dates() {
        let parsed = parse_posted_at("2001-01-01T00:00:00Z").expect("past date");
        assert_eq!(parsed, datetime!(2001-01-01 00:00:00 UTC));
    }

    #[test]
    fn posted_at_keeps_offset() {
        let parsed = parse_posted_at("2030-06-01T18:00:00+03:00").expect("offset date");
        assert_eq!(parsed.offset().whole_hours(), 3);
        assert!(parse_posted_at("tomorrow").is_err());
    }
}
