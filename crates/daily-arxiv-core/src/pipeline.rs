use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::arxiv::ArxivClient;
use crate::completeness::CompletenessPolicy;
use crate::config::HarvestConfig;
use crate::enrichment::FallbackEnricher;
use crate::error::Result;
use crate::fetch::ListingFetcher;
use crate::http::HttpClient;
use crate::listing::Listing;
use crate::output::RecordSink;
use crate::rate_limit::RateLimiter;
use crate::record::PaperRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub categories: usize,
    pub failed_categories: usize,
    pub written: usize,
    pub enriched: usize,
    pub failed: usize,
}

impl HarvestReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.failed_categories == 0
    }
}

/// Builds the metadata fallback when it is enabled. Nothing is constructed otherwise.
pub fn build_enricher(config: &HarvestConfig, http: HttpClient) -> Option<FallbackEnricher> {
    if !config.fallback_enabled {
        return None;
    }
    let client = ArxivClient::with_base_url(http, &config.api_base_url, config.page_size);
    Some(FallbackEnricher::new(
        Arc::new(client),
        Arc::new(RateLimiter::new(config.api_delay())),
        CompletenessPolicy::new(true),
    ))
}

/// Fills default links, repairs the record if needed and hands it to `sink`.
/// A failed repair drops the record and is counted in `report.failed`.
pub async fn process_record<S>(
    mut record: PaperRecord,
    enricher: Option<&FallbackEnricher>,
    sink: &mut S,
    report: &mut HarvestReport,
) -> Result<()>
where
    S: RecordSink + ?Sized,
{
    record.ensure_links();
    let record = match enricher {
        Some(enricher) if enricher.policy().needs_fallback(&record) => {
            let id = record.id.clone();
            match enricher.enrich(record).await {
                Ok(record) => {
                    report.enriched += 1;
                    record
                }
                Err(e) => {
                    error!(%id, error = %e, "dropping record after failed enrichment");
                    report.failed += 1;
                    return Ok(());
                }
            }
        }
        _ => record,
    };
    sink.write(&record)?;
    report.written += 1;
    Ok(())
}

/// Fetches every configured category page and pushes the extracted records through
/// the completeness check and optional fallback, in document order.
pub struct Harvester {
    fetcher: ListingFetcher,
    enricher: Option<FallbackEnricher>,
    categories: Vec<String>,
    targets: HashSet<String>,
}

impl Harvester {
    pub fn new(
        fetcher: ListingFetcher,
        enricher: Option<FallbackEnricher>,
        categories: Vec<String>,
    ) -> Self {
        let targets = categories.iter().cloned().collect();
        Self {
            fetcher,
            enricher,
            categories,
            targets,
        }
    }

    pub fn from_config(config: &HarvestConfig) -> Result<Self> {
        let http = HttpClient::new(config.max_retries, &config.user_agent)?;
        let fetcher = ListingFetcher::new(
            http.clone(),
            &config.listing_base_url,
            Arc::new(RateLimiter::new(config.listing_delay())),
        );
        Ok(Self::new(
            fetcher,
            build_enricher(config, http),
            config.categories.clone(),
        ))
    }

    pub async fn run<S>(&self, sink: &mut S) -> Result<HarvestReport>
    where
        S: RecordSink + ?Sized,
    {
        let mut report = HarvestReport::default();
        for category in &self.categories {
            report.categories += 1;
            if let Err(e) = self.run_category(category, sink, &mut report).await {
                error!(%category, error = %e, "failed to harvest category");
                report.failed_categories += 1;
            }
        }
        sink.flush()?;
        info!(
            categories = report.categories,
            written = report.written,
            enriched = report.enriched,
            failed = report.failed,
            "harvest finished"
        );
        Ok(report)
    }

    pub async fn run_category<S>(
        &self,
        category: &str,
        sink: &mut S,
        report: &mut HarvestReport,
    ) -> Result<()>
    where
        S: RecordSink + ?Sized,
    {
        let html = self.fetcher.fetch(category).await?;
        let listing = Listing::parse(&html)?;
        let before = report.written;
        for record in listing.papers(&self.targets) {
            process_record(record, self.enricher.as_ref(), sink, report).await?;
        }
        info!(%category, written = report.written - before, "category harvested");
        Ok(())
    }
}
