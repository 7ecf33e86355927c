pub mod auth;
pub mod categories;
pub mod menu;
pub mod news;
pub mod system;

use super::error::ApiError;

/// Path ids are parsed by hand so a malformed id gets the JSON error body.
pub(crate) fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Invalid id", Some(format!("`{raw}` is not a valid id"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").expect("id"), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("99999999999").is_err());
    }
}
