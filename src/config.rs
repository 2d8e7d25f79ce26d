//! Runtime configuration for the archive reader.
//!
//! Values come from environment variables with defaults that match the
//! public IETF mail archive. Rocket's own figment configuration still owns
//! the listen address and port.

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://mailarchive.ietf.org";
const DEFAULT_USER_AGENT: &str = "archive-reader/0.1 (mailing-list archive reader)";

fn env_duration_millis<F>(lookup: &F, key: &str, default_millis: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default_millis))
}

fn env_duration_secs<F>(lookup: &F, key: &str, default_secs: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

fn env_usize<F>(lookup: &F, key: &str, default: usize) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_string<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Display policy applied while reconstructing threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadPolicy {
    /// A thread is flagged hot once it holds more than this many messages.
    pub hot_threshold: usize,
}

impl Default for ThreadPolicy {
    fn default() -> Self {
        Self { hot_threshold: 10 }
    }
}

/// Time-to-live for each cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub lists: Duration,
    pub threads: Duration,
    pub messages: Duration,
    pub search: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            lists: Duration::from_secs(60 * 60),
            threads: Duration::from_secs(5 * 60),
            messages: Duration::from_secs(24 * 60 * 60),
            search: Duration::from_secs(2 * 60),
        }
    }
}

/// Server-side configuration: upstream host, timeouts, cache TTLs and thread policy.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub cache_ttls: CacheTtls,
    pub thread_policy: ThreadPolicy,
}

impl ReaderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ttl_defaults = CacheTtls::default();
        let cache_ttls = CacheTtls {
            lists: env_duration_secs(&lookup, "CACHE_LISTS_TTL_SECS", ttl_defaults.lists.as_secs()),
            threads: env_duration_secs(
                &lookup,
                "CACHE_THREADS_TTL_SECS",
                ttl_defaults.threads.as_secs(),
            ),
            messages: env_duration_secs(
                &lookup,
                "CACHE_MESSAGE_TTL_SECS",
                ttl_defaults.messages.as_secs(),
            ),
            search: env_duration_secs(
                &lookup,
                "CACHE_SEARCH_TTL_SECS",
                ttl_defaults.search.as_secs(),
            ),
        };

        Self {
            base_url: env_string(&lookup, "ARCHIVE_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            user_agent: env_string(&lookup, "ARCHIVE_USER_AGENT", DEFAULT_USER_AGENT),
            request_timeout: env_duration_millis(&lookup, "ARCHIVE_TIMEOUT_MS", 15_000),
            cache_ttls,
            thread_policy: ThreadPolicy {
                hot_threshold: env_usize(
                    &lookup,
                    "THREAD_HOT_THRESHOLD",
                    ThreadPolicy::default().hot_threshold,
                ),
            },
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ReaderConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReaderConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_match_public_archive() {
        let config = config_from(&[]);
        assert_eq!(config.base_url, "https://mailarchive.ietf.org");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.cache_ttls, CacheTtls::default());
        assert_eq!(config.thread_policy.hot_threshold, 10);
    }

    #[test]
    fn overrides_are_applied() {
        let config = config_from(&[
            ("ARCHIVE_BASE_URL", "http://localhost:9000/"),
            ("ARCHIVE_TIMEOUT_MS", "2500"),
            ("CACHE_THREADS_TTL_SECS", "30"),
            ("THREAD_HOT_THRESHOLD", "4"),
        ]);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.cache_ttls.threads, Duration::from_secs(30));
        assert_eq!(config.thread_policy.hot_threshold, 4);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("ARCHIVE_TIMEOUT_MS", "soon"),
            ("ARCHIVE_USER_AGENT", "   "),
        ]);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }
}
