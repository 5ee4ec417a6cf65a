//! Listing extraction and metadata fallback for daily arXiv harvesting.

pub mod error;
pub mod text;
pub mod categories;
pub mod record;
pub mod listing;
pub mod completeness;
pub mod rate_limit;
pub mod enrichment;
pub mod arxiv;
pub mod http;
pub mod fetch;
pub mod config;
pub mod pipeline;
pub mod output;

pub use error::{HarvestError, Result};
pub use config::HarvestConfig;
pub use record::{Field, FieldValue, PaperRecord};
pub use listing::Listing;
pub use completeness::CompletenessPolicy;
pub use rate_limit::{Clock, RateLimiter, TokioClock};
pub use enrichment::{FallbackEnricher, LookupRecord, MetadataLookup};
pub use pipeline::{HarvestReport, Harvester};
pub use output::{JsonLinesSink, RecordSink};
