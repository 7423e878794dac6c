//! Ranked name list from the external ranking page

use anyhow::{bail, Context, Result};
use scraper::Html;
use tracing::{debug, info};

use crate::fetch::Fetch;
use crate::html::{element_text, selector};
use crate::types::RankedEntry;

/// Rows with fewer cells are not data rows
const MIN_COLUMNS: usize = 5;

/// Fetch the ranking page and parse its first table.
pub fn fetch_ranking<F: Fetch>(fetcher: &F, url: &str) -> Result<Vec<RankedEntry>> {
    let html = fetcher
        .fetch_text(url)
        .with_context(|| format!("Ranking source unreachable: {}", url))?;
    let entries = parse_ranking(&html)?;
    info!("Parsed {} ranked entries from {}", entries.len(), url);
    Ok(entries)
}

/// Parse the first `<table>` into (rank, name) pairs, first and last `td` of each row.
///
/// Short rows are skipped without shifting later rows.
pub fn parse_ranking(html: &str) -> Result<Vec<RankedEntry>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let th_sel = selector("th")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let Some(table) = document.select(&table_sel).next() else {
        bail!("No table found on ranking page");
    };

    let headers: Vec<String> = table.select(&th_sel).map(element_text).collect();
    debug!("Ranking headers: {:?}", headers);

    let mut entries = Vec::new();
    for row in table.select(&tr_sel) {
        let cols: Vec<_> = row.select(&td_sel).collect();
        if cols.len() < MIN_COLUMNS {
            continue;
        }
        let (Some(first), Some(last)) = (cols.first(), cols.last()) else {
            continue;
        };
        entries.push(RankedEntry {
            rank: element_text(*first),
            name: element_text(*last),
        });
    }

    Ok(entries)
}
