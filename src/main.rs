use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

mod catalog;
mod config;
mod fetch;
mod html;
mod image;
mod infobox;
mod pipeline;
mod ranking;
mod record;
mod resolve;
mod types;
mod utils;

use config::Config;
use fetch::HttpClient;
use pipeline::Pipeline;
use utils::{osc8_file_link, osc8_link};

#[derive(Parser)]
#[command(name = "unicatalog")]
#[command(about = "University catalog builder: ranking table + encyclopedia infobox metadata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the ranking, resolve every university and write the catalog JSON
    Build {
        /// Output JSON file (overwritten)
        #[arg(short, long, default_value = config::OUTPUT_PATH)]
        output: PathBuf,
        /// Page holding the ranking table
        #[arg(long, default_value = config::RANKING_URL)]
        ranking_url: String,
        /// Only process the first N ranked entries
        #[arg(short = 'n', long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        limit: Option<usize>,
        /// Quiet mode - suppress progress output
        #[arg(short, long)]
        quiet: bool,
        #[command(flatten)]
        net: NetArgs,
    },
    /// Resolve logo URLs for the given names without writing anything
    Logo {
        /// University names, e.g. "Yonsei University"
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
        #[command(flatten)]
        net: NetArgs,
    },
    /// Validate an existing catalog against the front-end contract
    Check {
        #[arg(default_value = config::OUTPUT_PATH)]
        path: PathBuf,
    },
}

/// Reference-service URLs and network policy shared by the fetching commands
#[derive(Args)]
struct NetArgs {
    /// Base URL article links are resolved against
    #[arg(long, default_value = config::WIKI_BASE)]
    wiki_base: String,
    /// Search endpoint, queried with ?search=<name>
    #[arg(long, default_value = config::SEARCH_ENDPOINT)]
    search_endpoint: String,
    /// Base of the fallback image/description search URLs
    #[arg(long, default_value = config::IMAGE_SEARCH_BASE)]
    image_search_base: String,
    /// Seconds to wait between names
    #[arg(long, default_value = "1", value_parser = parse_seconds)]
    delay: Duration,
    /// Per-request timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_seconds)]
    timeout: Duration,
    /// Retries for transient failures (network errors, 429, 5xx)
    #[arg(long, default_value_t = 3)]
    retries: u32,
    /// First retry backoff in seconds, doubled on each attempt
    #[arg(long, default_value = "2", value_parser = parse_seconds)]
    backoff: Duration,
    /// Cache fetched pages under this directory and reuse them on later runs
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    #[arg(long, default_value = config::USER_AGENT)]
    user_agent: String,
}

impl NetArgs {
    fn into_config(self) -> Config {
        Config {
            wiki_base: self.wiki_base,
            search_endpoint: self.search_endpoint,
            image_search_base: self.image_search_base,
            delay: self.delay,
            timeout: self.timeout,
            max_retries: self.retries,
            backoff: self.backoff,
            cache_dir: self.cache_dir,
            user_agent: self.user_agent,
            ..Config::default()
        }
    }
}

fn parse_seconds(s: &str) -> std::result::Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{}' is not a number of seconds", s))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{}': {}", s, e))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_build(config: Config, limit: Option<usize>, quiet: bool) -> Result<()> {
    let client = HttpClient::new(&config)?;
    let pipeline = Pipeline::new(client, config).quiet(quiet);

    if !quiet {
        println!("Fetching ranking from {}...", pipeline.config().ranking_url);
    }
    let summary = pipeline.run(limit)?;

    if !quiet {
        println!();
        summary.print();
        let output = &pipeline.config().output_path;
        println!(
            "Catalog written to {}",
            osc8_file_link(output, &output.display().to_string())
        );
    }
    Ok(())
}

fn run_logo(config: Config, names: &[String]) -> Result<()> {
    let client = HttpClient::new(&config)?;
    let pipeline = Pipeline::new(client, config);

    for (i, name) in names.iter().enumerate() {
        if i > 0 && !pipeline.config().delay.is_zero() {
            thread::sleep(pipeline.config().delay);
        }
        match pipeline.lookup(name) {
            Ok(lookup) => println!(
                "{}: {} ({})",
                osc8_link(&lookup.article_url, name),
                lookup.image.url,
                lookup.image.source.as_str()
            ),
            Err(e) => eprintln!("Could not resolve {}: {:#}", name, e),
        }
    }
    Ok(())
}

fn run_check(path: &Path) -> Result<()> {
    let count = catalog::verify_catalog(path)?;
    println!(
        "OK: {} records in {}",
        count,
        osc8_file_link(path, &path.display().to_string())
    );
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            output,
            ranking_url,
            limit,
            quiet,
            net,
        } => {
            let config = Config {
                ranking_url,
                output_path: output,
                ..net.into_config()
            };
            run_build(config, limit, quiet)
        }
        Commands::Logo { names, net } => run_logo(net.into_config(), &names),
        Commands::Check { path } => run_check(&path),
    }
}
