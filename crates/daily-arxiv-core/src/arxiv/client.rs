use async_trait::async_trait;

use crate::arxiv::parser::parse_atom_response;
use crate::enrichment::{LookupRecord, MetadataLookup};
use crate::error::Result;
use crate::http::HttpClient;

pub const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";

/// arXiv Atom API client for single-identifier lookups. Throttling is left to the
/// caller's [`RateLimiter`](crate::rate_limit::RateLimiter).
pub struct ArxivClient {
    http: HttpClient,
    base_url: String,
    page_size: u32,
}

impl ArxivClient {
    pub fn with_base_url(http: HttpClient, base_url: &str, page_size: u32) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            page_size,
        }
    }

    pub fn query_url(&self, id: &str) -> String {
        let sep = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}id_list={}&max_results={}",
            self.base_url, sep, id, self.page_size
        )
    }

}

#[async_trait]
impl MetadataLookup for ArxivClient {
    fn name(&self) -> &str {
        "arxiv"
    }

    async fn lookup(&self, id: &str) -> Result<Vec<LookupRecord>> {
        let xml = self.http.get(&self.query_url(id)).await?;
        parse_atom_response(&xml)
    }
}
