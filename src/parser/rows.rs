use super::{depth_from_class, element_text, first_text, hash_from_href, selector};
use crate::models::MessageRow;
use scraper::{Html, Selector};
use std::sync::OnceLock;

static ROWS: OnceLock<Selector> = OnceLock::new();
static SUBJECT_CELL: OnceLock<Selector> = OnceLock::new();
static DETAIL_LINK: OnceLock<Selector> = OnceLock::new();
static FROM_CELL: OnceLock<Selector> = OnceLock::new();
static DATE_CELL: OnceLock<Selector> = OnceLock::new();
static THREAD_CELL: OnceLock<Selector> = OnceLock::new();
static NEXT_PAGE: OnceLock<Selector> = OnceLock::new();
static ANCHORS: OnceLock<Selector> = OnceLock::new();

/// Rows of one listing or search page, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub rows: Vec<MessageRow>,
    /// The page links to a following page.
    pub has_next: bool,
}

/// Parse an archive browse page into message rows.
///
/// Rows without a detail link keep an empty `hash`; thread reconstruction
/// drops them.
pub fn parse_listing(html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let subject_sel = selector(&SUBJECT_CELL, ".subj-col");
    let link_sel = selector(&DETAIL_LINK, "a.msg-detail");

    let rows = document
        .select(selector(&ROWS, ".xtbody .xtr"))
        .map(|row| {
            let subject_cell = row.select(subject_sel).next();
            let depth = subject_cell.as_ref().map(depth_from_class).unwrap_or(0);
            let link = subject_cell.and_then(|cell| cell.select(link_sel).next());

            let (subject, hash) = match link {
                Some(link) => (
                    element_text(&link).trim().to_string(),
                    hash_from_href(link.value().attr("href").unwrap_or_default()),
                ),
                None => (String::new(), String::new()),
            };

            MessageRow {
                hash,
                subject,
                from: first_text(&row, selector(&FROM_CELL, ".from-col")),
                date: first_text(&row, selector(&DATE_CELL, ".date-col")),
                thread_id: first_text(&row, selector(&THREAD_CELL, ".thread-col")),
                depth,
            }
        })
        .collect();

    let has_next = document
        .select(selector(&NEXT_PAGE, ".pagination .next"))
        .next()
        .is_some()
        || document
            .select(selector(&ANCHORS, "a"))
            .any(|anchor| element_text(&anchor).contains("Next"));

    ListingPage { rows, has_next }
}
