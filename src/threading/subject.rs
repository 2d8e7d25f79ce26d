//! Subject clean-up for thread display.

use regex::Regex;
use std::sync::OnceLock;

/// Lazy-initialized regex for a leading list tag such as `[TLS]` or `[dns-privacy]`
static LIST_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_list_tag_regex() -> &'static Regex {
    LIST_TAG_REGEX
        .get_or_init(|| Regex::new(r"^\[[\w-]+\]\s*").expect("Invalid list tag regex"))
}

/// Remove one leading bracketed list tag from a subject.
///
/// Only a tag at the very start is removed; reply prefixes are kept, so
/// `"Re: [TLS] ECH"` is returned unchanged.
///
/// ```rust
/// use archive_reader::threading::subject::strip_list_tag;
///
/// assert_eq!(strip_list_tag("[TLS] ECH status"), "ECH status");
/// assert_eq!(strip_list_tag("[dns-privacy]Padding"), "Padding");
/// assert_eq!(strip_list_tag("Re: [TLS] ECH status"), "Re: [TLS] ECH status");
/// ```
pub fn strip_list_tag(subject: &str) -> String {
    get_list_tag_regex().replace(subject, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_simple_tag() {
        assert_eq!(strip_list_tag("[TLS] ECH status"), "ECH status");
    }

    #[test]
    fn test_strip_only_first_tag() {
        assert_eq!(strip_list_tag("[TLS] [Errata] RFC 8446"), "[Errata] RFC 8446");
    }

    #[test]
    fn test_tag_with_spaces_is_kept() {
        assert_eq!(strip_list_tag("[PATCH v2] thing"), "[PATCH v2] thing");
    }

    #[test]
    fn test_no_tag() {
        assert_eq!(strip_list_tag("Plain subject"), "Plain subject");
        assert_eq!(strip_list_tag(""), "");
    }
}
