//! Network access behind the `Fetch` trait so stages can run against canned pages

use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;

/// Something that can GET a URL and hand back the body as text.
pub trait Fetch {
    fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP client with timeout, bounded retry and an optional disk cache
pub struct HttpClient {
    client: reqwest::blocking::Client,
    cache_dir: Option<PathBuf>,
    max_retries: u32,
    backoff: Duration,
}

/// A failed attempt, tagged with whether trying again could help
struct AttemptError {
    error: anyhow::Error,
    retryable: bool,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            cache_dir: config.cache_dir.clone(),
            max_retries: config.max_retries,
            backoff: config.backoff,
        })
    }

    fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url) {
                Ok(text) => return Ok(text),
                Err(failed) if failed.retryable && attempt < self.max_retries => {
                    let wait = backoff_for(self.backoff, attempt);
                    warn!(
                        "{} (retry {}/{}), backing off {:.1}s",
                        failed.error,
                        attempt + 1,
                        self.max_retries,
                        wait.as_secs_f64()
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(failed) => return Err(failed.error),
            }
        }
    }

    fn fetch_once(&self, url: &str) -> std::result::Result<String, AttemptError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().map_err(|e| AttemptError {
            error: anyhow::Error::new(e).context(format!("Failed to fetch: {}", url)),
            retryable: true,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError {
                error: anyhow!("{} returned HTTP {}", url, status),
                retryable: is_retryable_status(status),
            });
        }

        response.text().map_err(|e| AttemptError {
            error: anyhow::Error::new(e).context(format!("Failed to read response: {}", url)),
            retryable: true,
        })
    }
}

impl Fetch for HttpClient {
    fn fetch_text(&self, url: &str) -> Result<String> {
        let cache_path = self.cache_dir.as_deref().map(|dir| url_to_cache_path(dir, url));

        if let Some(path) = cache_path.as_ref().filter(|p| p.is_file()) {
            debug!("cache hit {:?}", path);
            return fs::read_to_string(path)
                .with_context(|| format!("Failed to read cache: {:?}", path));
        }

        let text = self.fetch_with_retry(url)?;

        if let Some(path) = cache_path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &text).with_context(|| format!("Failed to write cache: {:?}", path))?;
        }

        Ok(text)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base * 2^attempt`, saturating
fn backoff_for(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Map a URL to a file under the cache dir. The scheme is dropped and the
/// query string is folded into the file name so search pages don't collide.
fn url_to_cache_path(cache_dir: &Path, url: &str) -> PathBuf {
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    let mut file = path.trim_end_matches('/').to_string();
    if let Some(query) = query {
        file.push_str("__");
        file.push_str(&query.replace(['/', '&', '='], "_"));
    }
    cache_dir.join(file)
}

/// In-memory fetcher serving canned pages; unknown URLs fail like a dead host.
#[cfg(test)]
#[derive(Default)]
pub struct StubFetcher {
    pages: std::collections::HashMap<String, String>,
    calls: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// URLs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

#[cfg(test)]
impl Fetch for StubFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        self.calls.borrow_mut().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("Failed to fetch: {} (no stub page)", url))
    }
}
