use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Anything that can hand back the HTML for a page URL.
pub trait PageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Plain GET over a shared `reqwest` client, default timeouts.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let start = Instant::now();
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!("GET {} ({} bytes, {} ms)", url, body.len(), start.elapsed().as_millis());
        Ok(body)
    }
}

/// Fetch with up to `retries` extra attempts on rate limiting or server errors.
pub async fn fetch_with_retry<S: PageSource>(
    source: &S,
    url: &str,
    retries: u32,
    backoff_ms: u64,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        match source.fetch(url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < retries && is_retryable(&e) => {
                let backoff = backoff_delay(backoff_ms, attempt);
                warn!(
                    "Fetch failed for {} (attempt {}/{}), backing off {:.1}s: {}",
                    url,
                    attempt + 1,
                    retries,
                    backoff.as_secs_f64(),
                    e
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// `backoff_ms * 2^attempt`, saturating instead of overflowing.
fn backoff_delay(backoff_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(backoff_ms.saturating_mul(2u64.saturating_pow(attempt)))
}

/// Only HTTP 429 and 5xx responses are retried; connect, TLS and body errors are not.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<reqwest::Error>()
        .and_then(|e| e.status())
        .is_some_and(|status| status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// The error `error_for_status` yields for a response with this status.
    pub(crate) fn status_error(code: u16) -> anyhow::Error {
        let res = axum::http::Response::builder().status(code).body("").unwrap();
        reqwest::Response::from(res).error_for_status().unwrap_err().into()
    }

    /// In-memory pages keyed by URL; missing URLs fail with a 404.
    pub(crate) struct StaticSource {
        pub pages: HashMap<String, String>,
        pub calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn new<I: IntoIterator<Item = (String, String)>>(pages: I) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PageSource for StaticSource {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages.get(url).cloned().ok_or_else(|| status_error(404))
        }
    }

    struct Flaky {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl PageSource for Flaky {
        async fn fetch(&self, _url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(status_error(503));
            }
            Ok("<html></html>".into())
        }
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let src = Flaky {
            failures_left: AtomicUsize::new(1),
            calls: AtomicUsize::new(0),
        };
        assert!(fetch_with_retry(&src, "u", 0, 0).await.is_err());
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let src = Flaky {
            failures_left: AtomicUsize::new(2),
            calls: AtomicUsize::new(0),
        };
        assert!(fetch_with_retry(&src, "u", 3, 1).await.is_ok());
        assert_eq!(src.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let src = StaticSource::new(Vec::<(String, String)>::new());
        assert!(fetch_with_retry(&src, "missing", 3, 1).await.is_err());
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
    }

    struct Counting {
        inner: HttpSource,
        calls: AtomicUsize,
    }

    impl PageSource for Counting {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(url).await
        }
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(&status_error(429)));
        assert!(is_retryable(&status_error(500)));
        assert!(is_retryable(&status_error(503)));
        assert!(!is_retryable(&status_error(404)));
        assert!(!is_retryable(&status_error(400)));
        assert!(!is_retryable(&anyhow::anyhow!("HTTP 503 for /q-part-500")));
    }

    #[tokio::test]
    async fn connect_error_not_retried_whatever_the_url() {
        for url in ["http://127.0.0.1:1/q-part-7", "http://127.0.0.1:1/q-part-500"] {
            let src = Counting {
                inner: HttpSource::new().unwrap(),
                calls: AtomicUsize::new(0),
            };
            assert!(fetch_with_retry(&src, url, 2, 1).await.is_err());
            assert_eq!(src.calls.load(Ordering::SeqCst), 1, "{}", url);
        }
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_delay(2000, 0), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2000, 3), Duration::from_millis(16000));
        assert_eq!(backoff_delay(2000, 80), Duration::from_millis(u64::MAX));
    }
}
