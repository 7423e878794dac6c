//! Run configuration: source URLs, output path, and network policy

use std::path::PathBuf;
use std::time::Duration;

pub const RANKING_URL: &str =
    "https://perso.utinam.cnrs.fr/~lages/datasets/WRWU17/list_univ_of_KR.html";
pub const WIKI_BASE: &str = "https://en.wikipedia.org";
pub const SEARCH_ENDPOINT: &str = "https://en.wikipedia.org/w/index.php";
pub const OUTPUT_PATH: &str = "src/data/universities_auto.json";
pub const UPLOAD_PREFIX: &str = "//upload.wikimedia.org/";
pub const IMAGE_SEARCH_BASE: &str = "https://www.google.com/search";
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; UniCatalogScraper/1.0)";

#[derive(Debug, Clone)]
pub struct Config {
    /// Page holding the ranked table
    pub ranking_url: String,
    /// Article and `File:` hrefs are joined onto this
    pub wiki_base: String,
    /// Search endpoint, queried with `?search=<name>`
    pub search_endpoint: String,
    pub output_path: PathBuf,
    /// Pause between two names
    pub delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    pub max_retries: u32,
    /// First retry waits this long, doubling each attempt
    pub backoff: Duration,
    pub user_agent: String,
    /// On-disk response cache; disabled when `None`
    pub cache_dir: Option<PathBuf>,
    /// Protocol-relative prefix identifying direct image assets
    pub upload_prefix: String,
    /// Base of the fallback search URLs for image and description
    pub image_search_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ranking_url: RANKING_URL.to_string(),
            wiki_base: WIKI_BASE.to_string(),
            search_endpoint: SEARCH_ENDPOINT.to_string(),
            output_path: PathBuf::from(OUTPUT_PATH),
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: Duration::from_secs(2),
            user_agent: USER_AGENT.to_string(),
            cache_dir: None,
            upload_prefix: UPLOAD_PREFIX.to_string(),
            image_search_base: IMAGE_SEARCH_BASE.to_string(),
        }
    }
}

impl Config {
    /// Config suited to offline tests: no delay, no retries.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            delay: Duration::ZERO,
            max_retries: 0,
            backoff: Duration::ZERO,
            ..Self::default()
        }
    }
}
