//! HTML parsing for archive pages.
//!
//! Parsing never fails. A page missing an expected element yields empty
//! strings or zero depth for the affected fields, and a page with no rows
//! yields an empty list.
//!
//! - `rows`: listing and search result pages
//! - `detail`: single-message pages, including the thread snippet

pub mod detail;
pub mod rows;

pub use detail::parse_message_detail;
pub use rows::{ListingPage, parse_listing};

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

static DEPTH_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_depth_regex() -> &'static Regex {
    DEPTH_REGEX.get_or_init(|| Regex::new(r"depth-(\d+)").expect("Invalid depth class regex"))
}

/// Compile a built-in selector once.
pub(crate) fn selector(cell: &'static OnceLock<Selector>, css: &str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("Invalid built-in selector"))
}

/// Reply depth encoded as a `depth-N` class on the element, 0 when absent.
pub(crate) fn depth_from_class(element: &ElementRef<'_>) -> u32 {
    element
        .value()
        .attr("class")
        .and_then(|classes| get_depth_regex().captures(classes))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

/// Last non-empty path segment of a detail link, e.g. `/arch/msg/tls/abc/` → `abc`.
pub(crate) fn hash_from_href(href: &str) -> String {
    href.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Trimmed text of the first match of `sel` under `scope`, empty when missing.
pub(crate) fn first_text(scope: &ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .next()
        .map(|el| element_text(&el).trim().to_string())
        .unwrap_or_default()
}
