//! Query parameter helpers shared by the route handlers.
//!
//! The structs follow Rocket's `FromForm` conventions and derive `JsonSchema`
//! so the generated OpenAPI document lists the available parameters.

use crate::error::ApiError;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

const fn default_page() -> u32 {
    1
}

/// Query string of `GET /search`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, rocket::form::FromForm)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    /// List to search in.
    #[serde(default)]
    pub list: Option<String>,
    /// Free-text query.
    #[serde(default)]
    pub q: Option<String>,
    /// One-based result page (defaults to the first page).
    #[field(default = 1)]
    #[serde(default = "default_page")]
    pub page: u32,
}

impl SearchParams {
    /// Trimmed query, empty when absent.
    pub fn query(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Trimmed list id, empty when absent.
    pub fn list(&self) -> &str {
        self.list.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn page(&self) -> u32 {
        self.page.max(1)
    }
}

/// Reject identifiers that could escape their path segment upstream.
///
/// List ids, message hashes and relative-date filters are short tokens of
/// ASCII letters, digits, `-`, `_` and `.`.
pub fn validate_token<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(value)
    } else {
        Err(ApiError::BadRequest(format!("invalid {field} '{value}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::form::Form;
    use rocket::http::RawStr;

    #[test]
    fn parses_search_query() {
        let parsed: SearchParams =
            Form::parse_encoded(RawStr::new("list=tls&q=%20ech%20&page=3")).unwrap();
        assert_eq!(parsed.list(), "tls");
        assert_eq!(parsed.query(), "ech");
        assert_eq!(parsed.page(), 3);

        let parsed_default: SearchParams = Form::parse("").unwrap();
        assert_eq!(parsed_default.list(), "");
        assert_eq!(parsed_default.query(), "");
        assert_eq!(parsed_default.page(), 1);
    }

    #[test]
    fn page_zero_is_first_page() {
        let parsed: SearchParams = Form::parse("q=x&page=0").unwrap();
        assert_eq!(parsed.page(), 1);
    }

    #[test]
    fn validates_tokens() {
        assert!(validate_token("list", "dns-privacy").is_ok());
        assert!(validate_token("hash", "Xy7_abc-Q.1").is_ok());
        assert!(validate_token("list", "..").is_err());
        assert!(validate_token("list", "tls/../ietf").is_err());
        assert!(validate_token("qdr", "").is_err());
    }
}
