use crate::error::ScrapeError;
use crate::models::Document;
use async_trait::async_trait;

/// Seam between the services and the scraping pipeline, so tests and
/// alternative sources can stand in for the live site.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_pages: usize,
        max_results: usize,
    ) -> Result<Vec<Document>, ScrapeError>;
}

/// Keyed document storage. The in-memory implementation lives in
/// [`crate::store::MemoryStore`]; a persistent backend can replace it
/// without touching the services.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, id: &str, document: Document);
    async fn get(&self, id: &str) -> Option<Document>;
}
