use super::{depth_from_class, element_text, hash_from_href, selector};
use crate::models::{MessageDetail, Sender, SnippetEntry};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

static SUBJECT: OnceLock<Selector> = OnceLock::new();
static FROM: OnceLock<Selector> = OnceLock::new();
static DATE: OnceLock<Selector> = OnceLock::new();
static BODY: OnceLock<Selector> = OnceLock::new();
static SNIPPET_ITEMS: OnceLock<Selector> = OnceLock::new();
static SNIPPET_LINK: OnceLock<Selector> = OnceLock::new();

static ADDRESS_REGEX: OnceLock<Regex> = OnceLock::new();
static SPACING_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches `Display Name <user@example.com>`.
fn get_address_regex() -> &'static Regex {
    ADDRESS_REGEX
        .get_or_init(|| Regex::new(r"^(.*?)\s*<(.+?)>$").expect("Invalid address regex"))
}

fn get_spacing_regex() -> &'static Regex {
    SPACING_REGEX.get_or_init(|| Regex::new(r"[\u{00A0}\s]+").expect("Invalid spacing regex"))
}

/// Split a `From:` line into name and address. Text without an address
/// becomes the name, with an empty email.
pub fn parse_sender(raw: &str) -> Sender {
    let raw = raw.trim();
    match get_address_regex().captures(raw) {
        Some(caps) => Sender {
            name: caps
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            email: Some(
                caps.get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            ),
        },
        None => Sender {
            name: raw.to_string(),
            email: Some(String::new()),
        },
    }
}

fn first_match<'a>(document: &'a Html, sel: &Selector) -> Option<ElementRef<'a>> {
    document.select(sel).next()
}

fn trimmed_text(element: Option<ElementRef<'_>>) -> String {
    element
        .map(|el| element_text(&el).trim().to_string())
        .unwrap_or_default()
}

fn parse_snippet_entry(item: ElementRef<'_>) -> SnippetEntry {
    let is_current = item.value().classes().any(|class| class == "current-msg");
    let link = item.select(selector(&SNIPPET_LINK, "a")).next();

    let href = link
        .and_then(|a| a.value().attr("href"))
        .unwrap_or_default();
    let subject = trimmed_text(link);

    // The author follows the link text, separated by non-breaking spaces.
    let full_text = element_text(&item);
    let author_part = match full_text.find(subject.as_str()) {
        Some(start) => &full_text[start + subject.len()..],
        None => "",
    };
    let author = get_spacing_regex()
        .replace_all(author_part, " ")
        .trim()
        .to_string();

    SnippetEntry {
        hash: hash_from_href(href),
        subject,
        from: Sender::named(author),
        depth: depth_from_class(&item),
        is_current,
    }
}

/// Parse a single-message page.
pub fn parse_message_detail(hash: &str, html: &str) -> MessageDetail {
    let document = Html::parse_document(html);

    let subject = trimmed_text(first_match(&document, selector(&SUBJECT, "#msg-body h3")));
    let from = parse_sender(&trimmed_text(first_match(&document, selector(&FROM, "#msg-from"))));
    let date = trimmed_text(first_match(&document, selector(&DATE, "#msg-date")));
    // Bodies are preformatted; keep their whitespace. Multipart messages
    // render one block per part.
    let body = document
        .select(selector(&BODY, ".msg-payload pre.wordwrap"))
        .map(|el| element_text(&el))
        .collect::<String>();

    let thread_snippet = document
        .select(selector(&SNIPPET_ITEMS, "ul.thread-snippet li"))
        .map(parse_snippet_entry)
        .collect();

    MessageDetail {
        hash: hash.to_string(),
        subject,
        from,
        date,
        body,
        thread_snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL: &str = "
        <html><body>
        <div id=\"msg-body\"><h3> [TLS] ECH status </h3></div>
        <div id=\"msg-from\">Alice Example &lt;alice@example.org&gt;</div>
        <div id=\"msg-date\">2024-05-01 10:00:00</div>
        <div class=\"msg-payload\"><pre class=\"wordwrap\">Hi all,\n\n  indented line\n</pre></div>
        <ul class=\"thread-snippet\">
          <li class=\"depth-0\"><a href=\"/arch/msg/tls/h1/\">[TLS] ECH status</a>&nbsp;&nbsp;Alice Example</li>
          <li class=\"depth-1 current-msg\"><a href=\"/arch/msg/tls/h2/\">Re: [TLS] ECH status</a>&nbsp; Bob\n Builder</li>
        </ul>
        </body></html>
    ";

    #[test]
    fn test_parse_detail_fields() {
        let detail = parse_message_detail("h2", DETAIL);
        assert_eq!(detail.hash, "h2");
        assert_eq!(detail.subject, "[TLS] ECH status");
        assert_eq!(detail.from.name, "Alice Example");
        assert_eq!(detail.from.email.as_deref(), Some("alice@example.org"));
        assert_eq!(detail.date, "2024-05-01 10:00:00");
        assert_eq!(detail.body, "Hi all,\n\n  indented line\n");
    }

    #[test]
    fn test_parse_thread_snippet() {
        let detail = parse_message_detail("h2", DETAIL);
        assert_eq!(detail.thread_snippet.len(), 2);

        let root = &detail.thread_snippet[0];
        assert_eq!(root.hash, "h1");
        assert_eq!(root.subject, "[TLS] ECH status");
        assert_eq!(root.from.name, "Alice Example");
        assert_eq!(root.depth, 0);
        assert!(!root.is_current);

        let reply = &detail.thread_snippet[1];
        assert_eq!(reply.hash, "h2");
        assert_eq!(reply.from.name, "Bob Builder");
        assert_eq!(reply.depth, 1);
        assert!(reply.is_current);
    }

    #[test]
    fn test_multipart_body_joins_parts() {
        let html = "
            <div class=\"msg-payload\"><pre class=\"wordwrap\">part one\n</pre></div>
            <div class=\"msg-payload\"><pre class=\"wordwrap\">part two\n</pre></div>
        ";
        let detail = parse_message_detail("mp", html);
        assert_eq!(detail.body, "part one\npart two\n");
    }

    #[test]
    fn test_parse_sender_without_address() {
        let sender = parse_sender("  Mailer Daemon ");
        assert_eq!(sender.name, "Mailer Daemon");
        assert_eq!(sender.email.as_deref(), Some(""));
    }

    #[test]
    fn test_missing_structure_defaults() {
        let detail = parse_message_detail("gone", "<html><body></body></html>");
        assert_eq!(detail.subject, "");
        assert_eq!(detail.from.name, "");
        assert_eq!(detail.body, "");
        assert!(detail.thread_snippet.is_empty());
    }
}
