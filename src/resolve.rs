//! Name -> article lookup through the reference service's search page

use anyhow::{Context, Result};
use scraper::Html;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::fetch::Fetch;
use crate::html::selector;

const RESULT_HEADING_LINK: &str = ".mw-search-result-heading a";

/// A fetched article page and the URL it came from
pub struct Article {
    pub url: String,
    pub document: Html,
}

/// `endpoint?search=<name>`, form-encoded (spaces become `+`)
pub fn search_url(endpoint: &str, name: &str) -> Result<String> {
    let url = Url::parse_with_params(endpoint, &[("search", name)])
        .with_context(|| format!("Invalid search endpoint: {}", endpoint))?;
    Ok(url.into())
}

/// Resolve a site-relative href (`/wiki/...`) against the wiki base
pub fn join_wiki(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).with_context(|| format!("Invalid wiki base: {}", base))?;
    let joined = base
        .join(href)
        .with_context(|| format!("Invalid link: {}", href))?;
    Ok(joined.into())
}

/// Search for `name` and follow the first result heading.
///
/// When the search page has no result headings the service already
/// redirected to an article, so the fetched page is the article.
pub fn resolve_article<F: Fetch>(fetcher: &F, config: &Config, name: &str) -> Result<Article> {
    let search = search_url(&config.search_endpoint, name)?;
    let html = fetcher.fetch_text(&search)?;
    let document = Html::parse_document(&html);

    let link_sel = selector(RESULT_HEADING_LINK)?;
    let href = document
        .select(&link_sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    let Some(href) = href else {
        debug!("No search results for '{}', using fetched page as article", name);
        return Ok(Article {
            url: search,
            document,
        });
    };

    let url = join_wiki(&config.wiki_base, &href)?;
    debug!("'{}' -> {}", name, url);
    let html = fetcher.fetch_text(&url)?;
    Ok(Article {
        url,
        document: Html::parse_document(&html),
    })
}
