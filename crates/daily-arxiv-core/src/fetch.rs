use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::http::HttpClient;
use crate::listing::listing_url;
use crate::rate_limit::RateLimiter;

pub const DEFAULT_LISTING_URL: &str = "https://arxiv.org/list";

/// Downloads the "new submissions" page of a category.
pub struct ListingFetcher {
    http: HttpClient,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl ListingFetcher {
    pub fn new(http: HttpClient, base_url: &str, limiter: Arc<RateLimiter>) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            limiter,
        }
    }

    pub fn url_for(&self, category: &str) -> String {
        listing_url(&self.base_url, category)
    }

    pub async fn fetch(&self, category: &str) -> Result<String> {
        let url = self.url_for(category);
        self.limiter.acquire().await;
        debug!(%url, "fetching listing page");
        self.http.get(&url).await
    }
}
