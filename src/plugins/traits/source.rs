use async_trait::async_trait;

use crate::models::Listing;
use crate::Result;

/// Produces the listings currently visible at a page URL, in page order.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<Listing>>;
}
