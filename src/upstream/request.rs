use std::fmt;

/// Which of the two upstream listing views a page comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingView {
    /// Flat, newest first; ordering is accurate but thread context is lost.
    Chronological,
    /// Grouped by thread (`gbt=1`); grouping is accurate but one large
    /// thread can fill a whole page.
    Grouped,
}

/// A GET against the archive host: a path plus ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl UpstreamRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// One page of a list's browse view. Page 1 is requested without a
    /// `page` parameter.
    pub fn listing(list_id: &str, view: ListingView, page: u32, qdr: Option<&str>) -> Self {
        let mut request = Self::new(format!("/arch/browse/{list_id}/"));
        if view == ListingView::Grouped {
            request = request.param("gbt", "1");
        }
        if let Some(qdr) = qdr {
            request = request.param("qdr", qdr);
        }
        if page > 1 {
            request = request.param("page", page.to_string());
        }
        request
    }

    /// The five pages fetched to reconstruct a list's active threads, in
    /// the order their rows are merged.
    pub fn thread_window(list_id: &str, qdr: Option<&str>) -> Vec<Self> {
        vec![
            Self::listing(list_id, ListingView::Chronological, 1, qdr),
            Self::listing(list_id, ListingView::Chronological, 2, qdr),
            Self::listing(list_id, ListingView::Grouped, 1, qdr),
            Self::listing(list_id, ListingView::Grouped, 2, qdr),
            Self::listing(list_id, ListingView::Grouped, 3, qdr),
        ]
    }

    pub fn message(list_id: &str, hash: &str) -> Self {
        Self::new(format!("/arch/msg/{list_id}/{hash}/"))
    }

    pub fn search(list_id: &str, query: &str, page: u32) -> Self {
        Self::new(format!("/arch/browse/{list_id}/"))
            .param("q", query)
            .param("page", page.to_string())
    }

    pub fn message_counts(list_id: &str) -> Self {
        Self::new("/api/v1/stats/msg_counts/")
            .param("list", list_id)
            .param("start", "20000101")
            .param("end", "20271231")
    }
}

impl fmt::Display for UpstreamRequest {
    /// Unencoded `path?key=value&...` form, used in logs and error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (index, (key, value)) in self.query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(f, "{separator}{key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_paths_follow_archive_layout() {
        let first = UpstreamRequest::listing("tls", ListingView::Chronological, 1, None);
        assert_eq!(first.to_string(), "/arch/browse/tls/");

        let grouped = UpstreamRequest::listing("tls", ListingView::Grouped, 3, Some("1w"));
        assert_eq!(grouped.to_string(), "/arch/browse/tls/?gbt=1&qdr=1w&page=3");
    }

    #[test]
    fn thread_window_is_chronological_then_grouped() {
        let window: Vec<String> = UpstreamRequest::thread_window("quic", None)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            window,
            vec![
                "/arch/browse/quic/",
                "/arch/browse/quic/?page=2",
                "/arch/browse/quic/?gbt=1",
                "/arch/browse/quic/?gbt=1&page=2",
                "/arch/browse/quic/?gbt=1&page=3",
            ]
        );
    }

    #[test]
    fn message_and_search_paths() {
        assert_eq!(
            UpstreamRequest::message("tls", "Xy7-abc").to_string(),
            "/arch/msg/tls/Xy7-abc/"
        );
        assert_eq!(
            UpstreamRequest::search("tls", "key share", 2).to_string(),
            "/arch/browse/tls/?q=key share&page=2"
        );
    }
}
