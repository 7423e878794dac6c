//! Logo resolution: direct upload URL, then the File: page, then a search placeholder

use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::fetch::Fetch;
use crate::html::selector;
use crate::infobox::is_upload;
use crate::resolve::join_wiki;
use crate::types::{ImageCandidate, ImageSource, ResolvedImage};

const FULL_IMAGE: &str = ".fullImageLink img";

/// Image-search URL for `"<name> logo png"`; always valid, never empty
pub fn fallback_image_url(search_base: &str, name: &str) -> Result<String> {
    let query = format!("{} logo png", name);
    let url = Url::parse_with_params(search_base, &[("tbm", "isch"), ("q", query.as_str())])
        .with_context(|| format!("Invalid image search base: {}", search_base))?;
    Ok(url.into())
}

/// Scheme-qualify a protocol-relative upload URL
fn absolute(src: &str) -> String {
    if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    }
}

/// Walk the fallback chain once; exactly one stage produces the result.
pub fn resolve_image<F: Fetch>(
    fetcher: &F,
    config: &Config,
    name: &str,
    candidate: Option<&ImageCandidate>,
) -> Result<ResolvedImage> {
    match candidate {
        Some(ImageCandidate::Upload(src)) if is_upload(src, &config.upload_prefix) => {
            return Ok(ResolvedImage {
                url: absolute(src),
                source: ImageSource::DirectUpload,
            });
        }
        Some(ImageCandidate::FilePage(href)) => match follow_file_page(fetcher, config, href) {
            Ok(Some(url)) => {
                return Ok(ResolvedImage {
                    url,
                    source: ImageSource::FileLink,
                })
            }
            Ok(None) => debug!("File page for '{}' has no upload image", name),
            Err(e) => warn!("File page for '{}' failed: {:#}", name, e),
        },
        _ => {}
    }

    Ok(ResolvedImage {
        url: fallback_image_url(&config.image_search_base, name)?,
        source: ImageSource::Fallback,
    })
}

/// Fetch a `File:` description page and return its full-resolution upload URL, if any
fn follow_file_page<F: Fetch>(fetcher: &F, config: &Config, href: &str) -> Result<Option<String>> {
    let url = join_wiki(&config.wiki_base, href)?;
    let html = fetcher.fetch_text(&url)?;
    let document = Html::parse_document(&html);
    let img_sel = selector(FULL_IMAGE)?;

    let src = document
        .select(&img_sel)
        .next()
        .and_then(|img| img.value().attr("src"))
        .filter(|src| is_upload(src, &config.upload_prefix))
        .map(absolute);
    Ok(src)
}
