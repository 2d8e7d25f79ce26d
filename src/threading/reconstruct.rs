//! Grouping merged rows into threads.
//!
//! ## Algorithm
//!
//! 1. Group rows by `thread_id`; a row without one forms its own thread
//!    keyed by its hash.
//! 2. Pick the root: the shallowest row, ties broken by the earliest date.
//! 3. Sort each thread's messages by ascending date.
//! 4. Derive reply count, last activity and the hot flag.
//! 5. Sort threads by descending last activity.
//!
//! Dates are compared as text. The archive renders them zero-padded and
//! most-significant-first, so string order is chronological order.
//! All sorts are stable and groups are kept in first-seen order, so the same
//! input rows always produce the same output.

use super::subject::strip_list_tag;
use crate::config::ThreadPolicy;
use crate::models::{MessageRow, MessageSummary, Sender, Thread};
use std::collections::HashMap;

/// Choose the canonical root of a thread.
///
/// Returns `None` only for an empty slice. When rows tie on both depth and
/// date, the first one wins.
pub fn select_root(rows: &[MessageRow]) -> Option<&MessageRow> {
    rows.iter()
        .min_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.date.cmp(&b.date)))
}

fn group_rows(rows: Vec<MessageRow>) -> Vec<(String, Vec<MessageRow>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<MessageRow>)> = Vec::new();

    for row in rows {
        let key = if row.thread_id.is_empty() {
            row.hash.clone()
        } else {
            row.thread_id.clone()
        };

        match index.get(&key) {
            Some(&position) => groups[position].1.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }

    groups
}

fn build_thread(
    id: String,
    mut rows: Vec<MessageRow>,
    list_id: &str,
    policy: &ThreadPolicy,
) -> Option<Thread> {
    let root = select_root(&rows)?.clone();

    rows.sort_by(|a, b| a.date.cmp(&b.date));

    let last_activity = rows.last().map(|row| row.date.clone()).unwrap_or_default();
    let message_count = rows.len();

    let messages = rows
        .into_iter()
        .map(|row| MessageSummary {
            hash: row.hash,
            subject: row.subject,
            from: Sender::named(row.from),
            date: row.date,
            depth: row.depth,
        })
        .collect();

    Some(Thread {
        id,
        subject: strip_list_tag(&root.subject),
        from: Sender::named(root.from),
        date: root.date,
        last_activity,
        reply_count: message_count - 1,
        hot: message_count > policy.hot_threshold,
        list: list_id.to_string(),
        root_hash: root.hash,
        messages,
    })
}

/// Build threads from a hash-unique pool of rows, most recently active first.
pub fn build_threads(rows: Vec<MessageRow>, list_id: &str, policy: &ThreadPolicy) -> Vec<Thread> {
    let mut threads: Vec<Thread> = group_rows(rows)
        .into_iter()
        .filter_map(|(id, group)| build_thread(id, group, list_id, policy))
        .collect();

    threads.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    threads
}
