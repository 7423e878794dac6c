use anyhow::{Context, Result};
use url::Url;

use crate::types::{InfoboxFields, RankedEntry, ResolvedImage, UniversityRecord, NOT_AVAILABLE};

/// Search URL standing in for the description; the text is never extracted
pub fn description_url(search_base: &str, name: &str) -> Result<String> {
    let query = format!("{} university description", name);
    let url = Url::parse_with_params(search_base, &[("q", query.as_str())])
        .with_context(|| format!("Invalid description search base: {}", search_base))?;
    Ok(url.into())
}

/// Merge extracted fields and the resolved image into a complete record.
///
/// Absent region/type become "N/A", an absent website becomes "".
pub fn assemble(
    entry: &RankedEntry,
    fields: InfoboxFields,
    image: ResolvedImage,
    description: String,
) -> UniversityRecord {
    UniversityRecord {
        rank: entry.rank.clone(),
        name: entry.name.clone(),
        region: fields.region.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        kind: fields.kind.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        description,
        image: image.url,
        website: fields.website.unwrap_or_default(),
    }
}
