pub mod http;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedWithEntries;

pub use http::HttpFetcher;

/// The fetch/parse seam: one request, one eventual parsed result or error.
#[async_trait]
pub trait Fetcher {
    async fn request_feed(&self, url: &str) -> Result<FeedWithEntries>;
}
