use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};

// ===== Mailing List Models =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailingList {
    pub id: String,
    pub name: String,
    pub description: String,
    pub area: String,
    pub active: bool,
    pub message_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListsResponse {
    pub lists: Vec<MailingList>,
    /// Sorted, de-duplicated areas of the lists above.
    pub areas: Vec<String>,
}

// ===== Listing Page Rows =====

/// One entry of an upstream listing page, before thread reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageRow {
    /// Trailing path segment of the detail link; empty when the row had no link.
    pub hash: String,
    pub subject: String,
    pub from: String,
    pub date: String,
    /// Upstream conversation identifier; empty when the row carried none.
    pub thread_id: String,
    pub depth: u32,
}

// ===== Thread Models =====

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sender {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Sender {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    pub hash: String,
    pub subject: String,
    pub from: Sender,
    pub date: String,
    pub depth: u32,
}

/// A reconstructed conversation.
///
/// `messages` is ordered by ascending date; `reply_count`, `last_activity`
/// and `hot` are derived from it when the thread is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub subject: String,
    pub from: Sender,
    pub date: String,
    pub last_activity: String,
    pub reply_count: usize,
    pub hot: bool,
    pub list: String,
    pub root_hash: String,
    pub messages: Vec<MessageSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadsResponse {
    pub threads: Vec<Thread>,
    pub has_more: bool,
}

// ===== Message Detail =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnippetEntry {
    pub hash: String,
    pub subject: String,
    pub from: Sender,
    pub depth: u32,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub hash: String,
    pub subject: String,
    pub from: Sender,
    pub date: String,
    pub body: String,
    /// The upstream's own view of the conversation around this message.
    pub thread_snippet: Vec<SnippetEntry>,
}

// ===== Search =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub subject: String,
    pub from: String,
    pub date: String,
    pub hash: String,
    pub list: String,
    pub thread_id: String,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub query: String,
    pub has_more: bool,
}
