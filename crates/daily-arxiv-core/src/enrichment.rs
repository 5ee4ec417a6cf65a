use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::completeness::CompletenessPolicy;
use crate::error::{HarvestError, Result};
use crate::rate_limit::RateLimiter;
use crate::record::{Field, PaperRecord};

/// Fields returned by a structured metadata lookup for one identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupRecord {
    pub authors: Vec<String>,
    pub title: String,
    pub categories: Vec<String>,
    pub comment: Option<String>,
    pub summary: String,
}

/// Single-identifier metadata source used to repair incomplete records.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Results for `id`. An empty vector means the source knows nothing about it.
    async fn lookup(&self, id: &str) -> Result<Vec<LookupRecord>>;
}

/// Copies every looked-up field into `record` whose current value is missing.
/// Returns the fields that were filled.
pub fn merge_missing(record: &mut PaperRecord, found: LookupRecord) -> Vec<Field> {
    let mut filled = Vec::new();
    let LookupRecord {
        authors,
        title,
        categories,
        comment,
        summary,
    } = found;

    if CompletenessPolicy::is_missing(record, Field::Authors) {
        record.authors = authors;
        filled.push(Field::Authors);
    }
    if CompletenessPolicy::is_missing(record, Field::Title) {
        record.title = title;
        filled.push(Field::Title);
    }
    if CompletenessPolicy::is_missing(record, Field::Categories) {
        record.categories = categories;
        filled.push(Field::Categories);
    }
    if CompletenessPolicy::is_missing(record, Field::Comment) {
        record.comment = comment;
        filled.push(Field::Comment);
    }
    if CompletenessPolicy::is_missing(record, Field::Summary) {
        record.summary = summary;
        filled.push(Field::Summary);
    }
    filled
}

/// Repairs incomplete records with one throttled lookup each.
pub struct FallbackEnricher {
    lookup: Arc<dyn MetadataLookup>,
    limiter: Arc<RateLimiter>,
    policy: CompletenessPolicy,
}

impl FallbackEnricher {
    pub fn new(
        lookup: Arc<dyn MetadataLookup>,
        limiter: Arc<RateLimiter>,
        policy: CompletenessPolicy,
    ) -> Self {
        Self {
            lookup,
            limiter,
            policy,
        }
    }

    pub fn policy(&self) -> &CompletenessPolicy {
        &self.policy
    }

    /// Returns `record` unchanged when it needs no fallback. Otherwise fills its missing
    /// fields from the first lookup result; no result at all is an error.
    pub async fn enrich(&self, mut record: PaperRecord) -> Result<PaperRecord> {
        if !self.policy.needs_fallback(&record) {
            return Ok(record);
        }
        debug!(
            id = %record.id,
            missing = ?self.policy.missing_fields(&record),
            source = self.lookup.name(),
            "looking up incomplete record"
        );

        self.limiter.acquire().await;
        let found = self
            .lookup
            .lookup(&record.id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::LookupExhausted(record.id.clone()))?;

        let filled = merge_missing(&mut record, found);
        info!(id = %record.id, filled = ?filled, "filled missing fields");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::rate_limit::Clock;
    use crate::rate_limit::testing::ManualClock;

    struct FakeLookup {
        results: Vec<LookupRecord>,
        clock: Arc<ManualClock>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeLookup {
        fn new(results: Vec<LookupRecord>, clock: Arc<ManualClock>) -> Self {
            Self {
                results,
                clock,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MetadataLookup for FakeLookup {
        fn name(&self) -> &str {
            "fake"
        }

        async fn lookup(&self, id: &str) -> Result<Vec<LookupRecord>> {
            self.calls
                .lock()
                .unwrap()
                .push((id.to_string(), self.clock.now()));
            Ok(self.results.clone())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl MetadataLookup for FailingLookup {
        fn name(&self) -> &str {
            "failing"
        }

        async fn lookup(&self, _id: &str) -> Result<Vec<LookupRecord>> {
            Err(HarvestError::Api("fake".to_string(), "HTTP 503".to_string()))
        }
    }

    fn api_result() -> LookupRecord {
        LookupRecord {
            authors: vec!["API Author".to_string()],
            title: "API Title".to_string(),
            categories: vec!["cs.AI".to_string()],
            comment: Some("API comment".to_string()),
            summary: "API summary".to_string(),
        }
    }

    fn complete_record() -> PaperRecord {
        let mut record = PaperRecord::new("2410.00001");
        record.title = "Listing Title".to_string();
        record.authors = vec!["Listing Author".to_string()];
        record.categories = vec!["cs.CV".to_string()];
        record.summary = "Listing summary".to_string();
        record
    }

    fn enricher(
        results: Vec<LookupRecord>,
        enabled: bool,
        delay: Duration,
    ) -> (FallbackEnricher, Arc<FakeLookup>) {
        let clock = Arc::new(ManualClock::new());
        let lookup = Arc::new(FakeLookup::new(results, clock.clone()));
        let limiter = Arc::new(RateLimiter::with_clock(delay, clock));
        let enricher = FallbackEnricher::new(
            lookup.clone(),
            limiter,
            CompletenessPolicy::new(enabled),
        );
        (enricher, lookup)
    }

    #[tokio::test]
    async fn complete_record_is_passed_through() {
        let (enricher, lookup) = enricher(vec![api_result()], true, Duration::from_secs(3));
        let record = complete_record();
        let out = enricher.enrich(record.clone()).await.unwrap();
        assert_eq!(out, record);
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn disabled_fallback_never_looks_up() {
        let (enricher, lookup) = enricher(vec![api_result()], false, Duration::from_secs(3));
        let mut record = complete_record();
        record.title.clear();
        let out = enricher.enrich(record.clone()).await.unwrap();
        assert_eq!(out, record);
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn fills_only_missing_fields() {
        let (enricher, lookup) = enricher(vec![api_result()], true, Duration::from_secs(3));
        let mut record = complete_record();
        record.title = "   ".to_string();
        record.categories.clear();

        let out = enricher.enrich(record.clone()).await.unwrap();

        assert_eq!(lookup.calls().len(), 1);
        assert_eq!(lookup.calls()[0].0, "2410.00001");
        assert_eq!(out.title, "API Title");
        assert_eq!(out.categories, vec!["cs.AI"]);
        assert_eq!(out.comment.as_deref(), Some("API comment"));
        assert_eq!(out.authors, record.authors);
        assert_eq!(out.summary, record.summary);
        assert_eq!(out.id, record.id);
        assert_eq!(out.pdf_url, record.pdf_url);
        assert_eq!(out.abs_url, record.abs_url);
    }

    #[tokio::test]
    async fn keeps_existing_comment() {
        let (enricher, _lookup) = enricher(vec![api_result()], true, Duration::ZERO);
        let mut record = complete_record();
        record.summary.clear();
        record.comment = Some("Listing comment".to_string());
        let out = enricher.enrich(record).await.unwrap();
        assert_eq!(out.comment.as_deref(), Some("Listing comment"));
        assert_eq!(out.summary, "API summary");
    }

    #[tokio::test]
    async fn empty_lookup_is_an_error() {
        let (enricher, _lookup) = enricher(Vec::new(), true, Duration::ZERO);
        let mut record = complete_record();
        record.authors.clear();
        let err = enricher.enrich(record).await.unwrap_err();
        assert!(matches!(err, HarvestError::LookupExhausted(id) if id == "2410.00001"));
    }

    #[tokio::test]
    async fn lookup_errors_propagate() {
        let clock = Arc::new(ManualClock::new());
        let enricher = FallbackEnricher::new(
            Arc::new(FailingLookup),
            Arc::new(RateLimiter::with_clock(Duration::ZERO, clock)),
            CompletenessPolicy::new(true),
        );
        let mut record = complete_record();
        record.title.clear();
        assert!(matches!(
            enricher.enrich(record).await,
            Err(HarvestError::Api(_, _))
        ));
    }

    #[tokio::test]
    async fn consecutive_lookups_respect_delay() {
        let delay = Duration::from_secs(3);
        let (enricher, lookup) = enricher(vec![api_result()], true, delay);
        for id in ["2410.00001", "2410.00002"] {
            let mut record = PaperRecord::new(id);
            record.title = "Only a title".to_string();
            enricher.enrich(record).await.unwrap();
        }
        let calls = lookup.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1 - calls[0].1 >= delay);
    }

    #[test]
    fn merge_reports_filled_fields() {
        let mut record = PaperRecord::new("x");
        record.title = "Kept".to_string();
        let filled = merge_missing(&mut record, api_result());
        assert_eq!(
            filled,
            vec![Field::Authors, Field::Categories, Field::Comment, Field::Summary]
        );
        assert_eq!(record.title, "Kept");
    }
}
