//! Field extraction from an article's infobox table
//!
//! Label and link matching are driven by the rule tables below; adding a
//! synonym means adding a needle, not a branch.

use anyhow::Result;
use scraper::{ElementRef, Html};

use crate::html::{element_text, selector};
use crate::types::{ImageCandidate, InfoboxFields};

const INFOBOX: &str = "table.infobox";
const FILE_PAGE_PREFIX: &str = "/wiki/File:";

/// Row-derived fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Region,
    Type,
}

impl Field {
    /// Turn a row value into the field value; empty results don't count as a match
    fn value_from(&self, value: &str) -> Option<String> {
        let value = match self {
            Field::Region => value.split(',').next().unwrap_or_default().trim(),
            Field::Type => value.trim(),
        };
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Row label rule: a field is taken from the first row whose lower-cased label contains any needle
pub struct LabelRule {
    pub field: Field,
    pub needles: &'static [&'static str],
}

impl LabelRule {
    fn matches(&self, label: &str) -> bool {
        self.needles.iter().any(|needle| label.contains(needle))
    }
}

pub const LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        field: Field::Region,
        needles: &["location", "city"],
    },
    LabelRule {
        field: Field::Type,
        needles: &["type", "institution"],
    },
];

/// Website strategies, tried in order
pub enum LinkRule {
    /// Absolute link whose visible text contains the word (case-insensitive)
    TextContains(&'static str),
    /// First link matching a CSS selector
    Css(&'static str),
}

pub const WEBSITE_RULES: &[LinkRule] = &[
    LinkRule::TextContains("official"),
    LinkRule::Css("a.external.text[href]"),
];

impl LinkRule {
    fn find(&self, infobox: ElementRef) -> Result<Option<String>> {
        let found = match self {
            LinkRule::TextContains(word) => {
                let link_sel = selector("a[href]")?;
                infobox.select(&link_sel).find_map(|a| {
                    let href = a.value().attr("href")?;
                    let text = element_text(a).to_lowercase();
                    (href.starts_with("http") && text.contains(word)).then(|| href.to_string())
                })
            }
            LinkRule::Css(css) => {
                let link_sel = selector(css)?;
                infobox
                    .select(&link_sel)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string)
            }
        };
        Ok(found)
    }
}

/// True when `src` points at the media upload host, protocol-relative or https
pub fn is_upload(src: &str, upload_prefix: &str) -> bool {
    src.starts_with(upload_prefix)
        || src
            .strip_prefix("https:")
            .is_some_and(|rest| rest.starts_with(upload_prefix))
}

/// Pull raw image/region/type/website candidates from the first infobox.
///
/// No infobox means every field is absent; that is not an error.
pub fn extract_fields(document: &Html, upload_prefix: &str) -> Result<InfoboxFields> {
    let infobox_sel = selector(INFOBOX)?;
    let Some(infobox) = document.select(&infobox_sel).next() else {
        return Ok(InfoboxFields::default());
    };

    let mut fields = InfoboxFields {
        image: image_candidate(infobox, upload_prefix)?,
        ..InfoboxFields::default()
    };

    for rule in WEBSITE_RULES {
        if let Some(href) = rule.find(infobox)? {
            fields.website = Some(href);
            break;
        }
    }

    scan_rows(infobox, &mut fields)?;
    Ok(fields)
}

fn image_candidate(infobox: ElementRef, upload_prefix: &str) -> Result<Option<ImageCandidate>> {
    let img_sel = selector("img[src]")?;
    let images: Vec<ElementRef> = infobox.select(&img_sel).collect();

    let upload = images
        .iter()
        .filter_map(|img| img.value().attr("src"))
        .find(|src| is_upload(src, upload_prefix));
    if let Some(src) = upload {
        return Ok(Some(ImageCandidate::Upload(src.to_string())));
    }

    let file_page = images
        .iter()
        .filter_map(|img| enclosing_href(*img))
        .find(|href| href.starts_with(FILE_PAGE_PREFIX));
    Ok(file_page.map(|href| ImageCandidate::FilePage(href.to_string())))
}

/// `href` of the nearest `<a>` wrapping the element
fn enclosing_href(element: ElementRef<'_>) -> Option<&str> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
}

/// One top-to-bottom pass over label/value rows; each field is set at most once.
fn scan_rows(infobox: ElementRef, fields: &mut InfoboxFields) -> Result<()> {
    let tr_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let td_sel = selector("td")?;

    for row in infobox.select(&tr_sel) {
        let (Some(th), Some(td)) = (row.select(&th_sel).next(), row.select(&td_sel).next()) else {
            continue;
        };
        let label = element_text(th).to_lowercase();
        let value = element_text(td);

        for rule in LABEL_RULES {
            let slot = match rule.field {
                Field::Region => &mut fields.region,
                Field::Type => &mut fields.kind,
            };
            if slot.is_none() && rule.matches(&label) {
                *slot = rule.field.value_from(&value);
            }
        }

        if fields.region.is_some() && fields.kind.is_some() {
            break;
        }
    }
    Ok(())
}
