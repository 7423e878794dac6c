//! Batch run: ranking -> per-name lookup -> record assembly -> catalog

use anyhow::{bail, Result};
use std::io::{self, Write};
use std::thread;
use tracing::{info, warn};

use crate::catalog::write_catalog;
use crate::config::Config;
use crate::fetch::Fetch;
use crate::image::{fallback_image_url, resolve_image};
use crate::infobox::extract_fields;
use crate::ranking::fetch_ranking;
use crate::record::{assemble, description_url};
use crate::resolve::resolve_article;
use crate::types::{ImageSource, InfoboxFields, RankedEntry, ResolvedImage, UniversityRecord};
use crate::utils::{osc8_link, progress_prefix};

/// What a single name's lookup produced
pub struct Lookup {
    pub article_url: String,
    pub fields: InfoboxFields,
    pub image: ResolvedImage,
}

/// One assembled record plus how it was obtained
pub struct Outcome {
    pub record: UniversityRecord,
    pub image_source: ImageSource,
    /// Article lookup failed and the record is all defaults
    pub failed: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub direct_images: usize,
    pub file_page_images: usize,
    pub fallback_images: usize,
    pub failed: usize,
}

impl RunSummary {
    fn add(&mut self, outcome: &Outcome) {
        self.records += 1;
        match outcome.image_source {
            ImageSource::DirectUpload => self.direct_images += 1,
            ImageSource::FileLink => self.file_page_images += 1,
            ImageSource::Fallback => self.fallback_images += 1,
        }
        if outcome.failed {
            self.failed += 1;
        }
    }

    pub fn print(&self) {
        println!(
            "Built {} records: {} direct images, {} from file pages, {} fallback ({} lookups failed).",
            self.records, self.direct_images, self.file_page_images, self.fallback_images, self.failed,
        );
    }
}

pub struct Pipeline<F> {
    fetcher: F,
    config: Config,
    quiet: bool,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(fetcher: F, config: Config) -> Self {
        Self {
            fetcher,
            config,
            quiet: false,
        }
    }

    /// Suppress per-name progress lines
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch the ranking, resolve every name, and write the catalog once.
    ///
    /// A missing or tableless ranking page, or one with no data rows, aborts
    /// before anything is written so the previous catalog stays in place.
    pub fn run(&self, limit: Option<usize>) -> Result<RunSummary> {
        let mut entries = fetch_ranking(&self.fetcher, &self.config.ranking_url)?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        if entries.is_empty() {
            bail!("No ranked entries parsed from {}", self.config.ranking_url);
        }

        let (records, summary) = self.build_records(&entries)?;
        write_catalog(&self.config.output_path, &records)?;
        info!(
            "Wrote {} records to {}",
            records.len(),
            self.config.output_path.display()
        );
        Ok(summary)
    }

    /// Resolve entries strictly in order, pausing between names.
    pub fn build_records(&self, entries: &[RankedEntry]) -> Result<(Vec<UniversityRecord>, RunSummary)> {
        let total = entries.len();
        let mut records = Vec::with_capacity(total);
        let mut summary = RunSummary::default();

        for (i, entry) in entries.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                thread::sleep(self.config.delay);
            }

            if !self.quiet {
                print!("{} {} -> ", progress_prefix(i + 1, total), entry.name);
                io::stdout().flush()?;
            }

            let outcome = self.process(entry)?;

            if !self.quiet {
                let record = &outcome.record;
                println!(
                    "{} | {} | image: {}{}",
                    record.region,
                    record.kind,
                    osc8_link(&record.image, outcome.image_source.as_str()),
                    if outcome.failed { " (lookup failed)" } else { "" },
                );
            }

            summary.add(&outcome);
            records.push(outcome.record);
        }

        Ok((records, summary))
    }

    /// Build the record for one entry. Lookup failures are logged and
    /// produce a fully defaulted record instead of an error.
    pub fn process(&self, entry: &RankedEntry) -> Result<Outcome> {
        let description = description_url(&self.config.image_search_base, &entry.name)?;

        let (fields, image, failed) = match self.lookup(&entry.name) {
            Ok(lookup) => (lookup.fields, lookup.image, false),
            Err(e) => {
                warn!("Lookup failed for '{}': {:#}", entry.name, e);
                let image = ResolvedImage {
                    url: fallback_image_url(&self.config.image_search_base, &entry.name)?,
                    source: ImageSource::Fallback,
                };
                (InfoboxFields::default(), image, true)
            }
        };

        let image_source = image.source;
        Ok(Outcome {
            record: assemble(entry, fields, image, description),
            image_source,
            failed,
        })
    }

    /// Article search, infobox extraction and image resolution for one name
    pub fn lookup(&self, name: &str) -> Result<Lookup> {
        let article = resolve_article(&self.fetcher, &self.config, name)?;
        let fields = extract_fields(&article.document, &self.config.upload_prefix)?;
        let image = resolve_image(&self.fetcher, &self.config, name, fields.image.as_ref())?;
        Ok(Lookup {
            article_url: article.url,
            fields,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::verify_catalog;
    use crate::fetch::StubFetcher;
    use std::fs;
    use url::Url;

    const RANKING_URL: &str = "https://rank.test/list_univ_of_KR.html";

    const RANKING: &str = r#"<html><body><table>
        <tr><th>Rank</th><th>World</th><th>Score</th><th>Country</th><th>Name</th></tr>
        <tr><td>1</td><td>120</td><td>71.2</td><td>KR</td><td>Seoul National University</td></tr>
        <tr><td>x</td><td>short</td></tr>
        <tr><td>2</td><td>201</td><td>65.0</td><td>KR</td><td>Konkuk University</td></tr>
        <tr><td>3</td><td>230</td><td>64.1</td><td>KR</td><td>Nowhere Institute</td></tr>
        </table></body></html>"#;

    const SNU_SEARCH: &str = "https://en.wikipedia.org/w/index.php?search=Seoul+National+University";
    const SNU_ARTICLE: &str = r#"<html><body><table class="infobox">
        <tr><td><img src="//upload.wikimedia.org/wikipedia/en/a/a1/SNU.png"></td></tr>
        <tr><th>Type</th><td>National</td></tr>
        <tr><th>Location</th><td>Seoul, South Korea</td></tr>
        <tr><td><a href="https://en.snu.ac.kr">Official website</a></td></tr>
        </table></body></html>"#;

    const KONKUK_SEARCH: &str = "https://en.wikipedia.org/w/index.php?search=Konkuk+University";
    const KONKUK_RESULTS: &str = r#"<html><body>
        <div class="mw-search-result-heading"><a href="/wiki/Konkuk_University">Konkuk University</a></div>
        </body></html>"#;
    const KONKUK_ARTICLE: &str = r#"<html><body><table class="infobox">
        <tr><td><a href="/wiki/File:Konkuk_seal.svg"><img src="/static/seal.png"></a></td></tr>
        <tr><th>Institution</th><td>Private</td></tr>
        </table></body></html>"#;
    const KONKUK_FILE: &str = r#"<html><body><div class="fullImageLink">
        <img src="//upload.wikimedia.org/wikipedia/en/4/4e/Konkuk_seal.svg.png"></div></body></html>"#;

    fn stub() -> StubFetcher {
        StubFetcher::new()
            .with_page(RANKING_URL, RANKING)
            .with_page(SNU_SEARCH, SNU_ARTICLE)
            .with_page(KONKUK_SEARCH, KONKUK_RESULTS)
            .with_page("https://en.wikipedia.org/wiki/Konkuk_University", KONKUK_ARTICLE)
            .with_page("https://en.wikipedia.org/wiki/File:Konkuk_seal.svg", KONKUK_FILE)
    }

    fn config(name: &str) -> Config {
        Config {
            ranking_url: RANKING_URL.to_string(),
            output_path: std::env::temp_dir()
                .join(format!("unicatalog-pipeline-{}-{}", std::process::id(), name))
                .join("universities_auto.json"),
            ..Config::for_tests()
        }
    }

    #[test]
    fn test_run_writes_complete_catalog_in_rank_order() {
        let config = config("run");
        let output = config.output_path.clone();
        let pipeline = Pipeline::new(stub(), config).quiet(true);

        let summary = pipeline.run(None).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                records: 3,
                direct_images: 1,
                file_page_images: 1,
                fallback_images: 1,
                failed: 1,
            }
        );

        let records: Vec<UniversityRecord> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let ranks: Vec<&str> = records.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1", "2", "3"]);

        assert_eq!(records[0].region, "Seoul");
        assert_eq!(records[0].kind, "National");
        assert_eq!(records[0].website, "https://en.snu.ac.kr");
        assert_eq!(records[0].image, "https://upload.wikimedia.org/wikipedia/en/a/a1/SNU.png");

        assert_eq!(records[1].region, "N/A");
        assert_eq!(records[1].kind, "Private");
        assert_eq!(records[1].image, "https://upload.wikimedia.org/wikipedia/en/4/4e/Konkuk_seal.svg.png");

        assert_eq!(records[2].region, "N/A");
        assert_eq!(records[2].website, "");
        assert!(records[2].image.contains("Nowhere+Institute+logo"));

        for record in &records {
            assert!(Url::parse(&record.image).is_ok());
            assert!(Url::parse(&record.description).is_ok());
        }
        assert_eq!(verify_catalog(&output).unwrap(), 3);

        fs::remove_dir_all(output.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_missing_ranking_aborts_without_output() {
        let config = config("abort");
        let output = config.output_path.clone();
        let pipeline = Pipeline::new(StubFetcher::new(), config).quiet(true);

        assert!(pipeline.run(None).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_header_only_table_keeps_previous_catalog() {
        let mut config = config("header-only");
        config.ranking_url = "https://rank.test/empty.html".to_string();
        let output = config.output_path.clone();

        let prior = vec![UniversityRecord {
            rank: "1".into(),
            name: "Seoul National University".into(),
            region: "Seoul".into(),
            kind: "National".into(),
            description: "https://www.google.com/search?q=Seoul+National+University".into(),
            image: "https://upload.wikimedia.org/wikipedia/en/a/a1/SNU.png".into(),
            website: "https://en.snu.ac.kr".into(),
        }];
        write_catalog(&output, &prior).unwrap();
        let before = fs::read_to_string(&output).unwrap();

        let fetcher = StubFetcher::new().with_page(
            "https://rank.test/empty.html",
            "<html><body><table><tr><th>Rank</th></tr></table></body></html>",
        );
        let pipeline = Pipeline::new(fetcher, config).quiet(true);

        let err = pipeline.run(None).unwrap_err();
        assert!(err.to_string().contains("No ranked entries"));
        assert_eq!(fs::read_to_string(&output).unwrap(), before);
        assert_eq!(verify_catalog(&output).unwrap(), 1);

        fs::remove_dir_all(output.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_zero_limit_is_error() {
        let config = config("zero-limit");
        let output = config.output_path.clone();
        let pipeline = Pipeline::new(stub(), config).quiet(true);

        assert!(pipeline.run(Some(0)).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_limit_truncates_entries() {
        let config = config("limit");
        let output = config.output_path.clone();
        let pipeline = Pipeline::new(stub(), config).quiet(true);

        let summary = pipeline.run(Some(1)).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(verify_catalog(&output).unwrap(), 1);

        fs::remove_dir_all(output.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_failed_lookup_yields_defaulted_record() {
        let pipeline = Pipeline::new(StubFetcher::new(), config("failed")).quiet(true);
        let entry = RankedEntry {
            rank: "9".into(),
            name: "Inha University".into(),
        };
        let outcome = pipeline.process(&entry).unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.image_source, ImageSource::Fallback);
        assert_eq!(outcome.record.rank, "9");
        assert_eq!(outcome.record.region, "N/A");
        assert_eq!(outcome.record.kind, "N/A");
        assert_eq!(outcome.record.website, "");
        assert!(outcome.record.image.contains("logo"));
        assert!(outcome.record.description.contains("Inha+University"));
    }

    #[test]
    fn test_lookup_reports_article_url() {
        let pipeline = Pipeline::new(stub(), config("lookup")).quiet(true);
        let lookup = pipeline.lookup("Konkuk University").unwrap();
        assert_eq!(lookup.article_url, "https://en.wikipedia.org/wiki/Konkuk_University");
        assert_eq!(lookup.image.source, ImageSource::FileLink);
    }
}
