mod logging;

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use daily_arxiv_core::http::HttpClient;
use daily_arxiv_core::output::read_json_lines;
use daily_arxiv_core::pipeline::{build_enricher, process_record};
use daily_arxiv_core::{HarvestConfig, HarvestReport, Harvester, JsonLinesSink, Listing, RecordSink};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "daily-arxiv",
    about = "Harvest newly listed arXiv papers as JSON Lines",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file. CATEGORIES, ARXIV_METADATA_FALLBACK and
    /// ARXIV_API_DELAY_SECONDS override its values when set.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-paper decisions.
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured category and write the new papers.
    Harvest {
        /// Output file, `-` for stdout. Defaults to data/<UTC date>.jsonl.
        #[arg(long)]
        output: Option<String>,
    },

    /// Extract papers from a saved listing page.
    Parse {
        #[arg(long)]
        file: PathBuf,
        /// Target category; repeatable. Defaults to the configured categories.
        #[arg(long = "category", action = clap::ArgAction::Append)]
        categories: Vec<String>,
    },

    /// Repair incomplete records from a JSON Lines file.
    Enrich {
        #[arg(long)]
        input: PathBuf,
        /// Output file, `-` for stdout.
        #[arg(long, default_value = "-")]
        output: String,
    },
}

// ─── Entry Point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = HarvestConfig::load(cli.config.as_deref()).context("loading config")?;

    match cli.command {
        Commands::Harvest { output } => {
            let output = output.unwrap_or_else(default_output_path);
            cmd_harvest(&config, &output).await
        }
        Commands::Parse { file, categories } => cmd_parse(&config, &file, categories),
        Commands::Enrich { input, output } => cmd_enrich(&config, &input, &output).await,
    }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn cmd_harvest(config: &HarvestConfig, output: &str) -> Result<()> {
    info!(
        categories = ?config.categories,
        fallback = config.fallback_enabled,
        %output,
        "starting harvest"
    );
    let harvester = Harvester::from_config(config)?;
    let mut sink = JsonLinesSink::new(open_output(output)?);
    let report = harvester.run(&mut sink).await?;
    finish(&report)
}

fn cmd_parse(config: &HarvestConfig, file: &Path, categories: Vec<String>) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let targets: HashSet<String> = if categories.is_empty() {
        config.categories.iter().cloned().collect()
    } else {
        categories.into_iter().map(|c| c.trim().to_string()).collect()
    };

    let listing = Listing::parse(&html)?;
    let mut sink = JsonLinesSink::new(io::stdout().lock());
    let mut count = 0usize;
    for record in listing.papers(&targets) {
        sink.write(&record)?;
        count += 1;
    }
    sink.flush()?;
    info!(papers = count, "parsed listing");
    Ok(())
}

async fn cmd_enrich(config: &HarvestConfig, input: &Path, output: &str) -> Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let records = read_json_lines(BufReader::new(file))?;

    let http = HttpClient::new(config.max_retries, &config.user_agent)?;
    let enricher = build_enricher(config, http);
    if enricher.is_none() {
        info!("metadata fallback disabled, records pass through unchanged");
    }

    let mut sink = JsonLinesSink::new(open_output(output)?);
    let mut report = HarvestReport::default();
    for record in records {
        process_record(record, enricher.as_ref(), &mut sink, &mut report).await?;
    }
    sink.flush()?;
    finish(&report)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn default_output_path() -> String {
    format!("data/{}.jsonl", chrono::Utc::now().format("%Y-%m-%d"))
}

fn open_output(path: &str) -> Result<Box<dyn Write>> {
    if path == "-" {
        return Ok(Box::new(io::stdout()));
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(Box::new(file))
}

fn finish(report: &HarvestReport) -> Result<()> {
    info!(
        written = report.written,
        enriched = report.enriched,
        failed = report.failed,
        failed_categories = report.failed_categories,
        "done"
    );
    if !report.is_clean() {
        bail!(
            "{} record(s) and {} categor(ies) failed",
            report.failed,
            report.failed_categories
        );
    }
    Ok(())
}
