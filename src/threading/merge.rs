//! Merging rows from overlapping listing pages.

use crate::models::MessageRow;
use std::collections::HashSet;

/// Concatenate pages in the given order, keeping the first row seen for
/// each hash.
///
/// Rows with an empty hash have no identity and are dropped. The order of
/// `pages` must be the order the pages were requested in, not the order
/// their responses arrived, so that the surviving copy of a duplicated
/// message is deterministic.
pub fn merge_pages<I>(pages: I) -> Vec<MessageRow>
where
    I: IntoIterator<Item = Vec<MessageRow>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for page in pages {
        for row in page {
            if row.hash.is_empty() || seen.contains(&row.hash) {
                continue;
            }
            seen.insert(row.hash.clone());
            merged.push(row);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hash: &str, subject: &str) -> MessageRow {
        MessageRow {
            hash: hash.to_string(),
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let chronological = vec![row("a", "from page 1"), row("b", "from page 1")];
        let grouped = vec![row("b", "from page 3"), row("c", "from page 3")];

        let merged = merge_pages(vec![chronological, grouped]);
        let hashes: Vec<&str> = merged.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b", "c"]);
        assert_eq!(merged[1].subject, "from page 1");
    }

    #[test]
    fn test_duplicates_within_a_page() {
        let merged = merge_pages(vec![vec![row("a", "1"), row("a", "2")]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].subject, "1");
    }

    #[test]
    fn test_rows_without_hash_are_dropped() {
        let merged = merge_pages(vec![vec![row("", "orphan"), row("x", "kept")]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].hash, "x");
    }

    #[test]
    fn test_no_pages() {
        assert!(merge_pages(Vec::<Vec<MessageRow>>::new()).is_empty());
    }
}
