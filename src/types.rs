//! Catalog record types shared by the pipeline stages

use serde::{Deserialize, Serialize};

/// Placeholder for region/type when the infobox has no matching row
pub const NOT_AVAILABLE: &str = "N/A";

/// Keys every catalog element carries, in output order
pub const RECORD_KEYS: [&str; 7] = [
    "rank",
    "name",
    "region",
    "type",
    "description",
    "image",
    "website",
];

/// One data row of the ranking table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    /// Rank cell, verbatim
    pub rank: String,
    /// Display name from the last column
    pub name: String,
}

/// One university in the output catalog.
///
/// Field order here is the key order of the written JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniversityRecord {
    pub rank: String,
    pub name: String,
    pub region: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub image: String,
    pub website: String,
}

/// Where an infobox image points before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCandidate {
    /// `src` already on the media upload host
    Upload(String),
    /// `href` of a `/wiki/File:` description page wrapping the image
    FilePage(String),
}

/// Raw values pulled out of an article's infobox; `None` means absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoboxFields {
    pub image: Option<ImageCandidate>,
    pub region: Option<String>,
    pub kind: Option<String>,
    pub website: Option<String>,
}

/// Which stage of the image fallback chain produced the final URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    DirectUpload,
    FileLink,
    Fallback,
}

impl ImageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSource::DirectUpload => "direct",
            ImageSource::FileLink => "file page",
            ImageSource::Fallback => "fallback",
        }
    }
}

/// Final image URL plus the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub source: ImageSource,
}
