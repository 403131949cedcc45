use crate::error::ServiceError;
use crate::generate::{self, ChatClient};
use crate::models::{Document, SearchResult, UserPreferences};
use crate::pdf::PdfExtractor;
use crate::traits::{DocumentStore, Searcher};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

const SEARCH_MAX_PAGES: usize = 5;
const MAX_KEYWORDS: usize = 5;

/// Content-addressed document id. The same content always yields the
/// same id, so re-running a search never duplicates store entries.
pub fn document_id(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("doc-{digest:x}")
}

/// Retrieval and storage of documents on top of a [`Searcher`].
pub struct DocumentService<S, T> {
    searcher: Arc<S>,
    store: Arc<T>,
    pdf: PdfExtractor,
}

impl<S: Searcher, T: DocumentStore> DocumentService<S, T> {
    pub fn new(searcher: Arc<S>, store: Arc<T>, pdf: PdfExtractor) -> Self {
        Self {
            searcher,
            store,
            pdf,
        }
    }

    /// Run a search, assign each document its id, and persist the
    /// results before returning them.
    pub async fn search_documents(
        &self,
        query: &str,
        max_pages: usize,
        max_results: usize,
    ) -> Result<Vec<Document>, ServiceError> {
        let mut documents = self.searcher.search(query, max_pages, max_results).await?;

        for document in &mut documents {
            let id = document_id(&document.content);
            document.metadata.insert("doc_id".to_string(), json!(id));
            self.store.put(&id, document.clone()).await;
        }

        info!(count = documents.len(), "documents stored");
        Ok(documents)
    }

    pub async fn document_by_id(&self, id: &str) -> Result<Document, ServiceError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| ServiceError::DocumentNotFound(id.to_string()))
    }

    /// Extract one PDF by URL, storing the result like a searched
    /// document.
    pub async fn extract_pdf_content(
        &self,
        pdf_url: &str,
        title: &str,
    ) -> Result<Document, ServiceError> {
        let (content, metadata) = self
            .pdf
            .download_and_extract(pdf_url, title)
            .await
            .ok_or_else(|| {
                ServiceError::Generation(format!("could not extract pdf content from {pdf_url}"))
            })?;

        let mut document = Document::new(content, metadata);
        let id = document_id(&document.content);
        document.metadata.insert("doc_id".to_string(), json!(id));
        self.store.put(&id, document.clone()).await;

        Ok(document)
    }
}

/// End-to-end query processing: validation, keyword extraction, search,
/// and answer synthesis.
pub struct QueryService<S, T> {
    documents: DocumentService<S, T>,
    chat: ChatClient,
}

impl<S: Searcher, T: DocumentStore> QueryService<S, T> {
    pub fn new(documents: DocumentService<S, T>, chat: ChatClient) -> Self {
        Self { documents, chat }
    }

    pub fn document_service(&self) -> &DocumentService<S, T> {
        &self.documents
    }

    /// Process one user query. Empty or whitespace-only queries are
    /// rejected before anything is fetched.
    pub async fn process_query(
        &self,
        query: &str,
        preferences: &UserPreferences,
    ) -> Result<SearchResult, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::EmptyQuery);
        }

        info!(query, "processing query");
        let keywords = self.chat.extract_keywords(query, MAX_KEYWORDS).await;

        let documents = self
            .documents
            .search_documents(query, SEARCH_MAX_PAGES, preferences.clamped_max_results())
            .await?;

        let response = generate::respond(&self.chat, query, &documents, preferences).await;

        Ok(SearchResult::new(query, keywords, &documents, response))
    }
}

#[cfg(test)]
mod tests {
    use super::{document_id, DocumentService, QueryService};
    use crate::error::{ErrorCategory, ScrapeError, ServiceError};
    use crate::generate::ChatClient;
    use crate::models::{Document, Metadata, UserPreferences};
    use crate::pdf::PdfExtractor;
    use crate::store::MemoryStore;
    use crate::traits::Searcher;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct FakeSearcher {
        documents: Vec<Document>,
    }

    #[async_trait]
    impl Searcher for FakeSearcher {
        async fn search(
            &self,
            _query: &str,
            _max_pages: usize,
            max_results: usize,
        ) -> Result<Vec<Document>, ScrapeError> {
            Ok(self.documents.iter().take(max_results).cloned().collect())
        }
    }

    fn doc(title: &str, content: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(title));
        metadata.insert("source".to_string(), json!("https://example.com/d"));
        Document::new(content, metadata)
    }

    fn service(documents: Vec<Document>) -> QueryService<FakeSearcher, MemoryStore> {
        let documents = DocumentService::new(
            Arc::new(FakeSearcher { documents }),
            Arc::new(MemoryStore::new()),
            PdfExtractor::disabled(),
        );
        QueryService::new(documents, ChatClient::disabled())
    }

    #[test]
    fn ids_are_stable_for_identical_content() {
        let first = document_id("Pasal 1: Hak ulayat diakui.");
        let second = document_id("Pasal 1: Hak ulayat diakui.");
        assert_eq!(first, second);
        assert!(first.starts_with("doc-"));
        assert_ne!(first, document_id("Pasal 2"));
    }

    #[tokio::test]
    async fn process_query_returns_documents_and_response() {
        let service = service(vec![
            doc("UU 5/1960", "Undang-undang pokok agraria mengatur hak ulayat."),
            doc("PP 24/1997", "Peraturan pendaftaran tanah."),
        ]);

        let preferences = UserPreferences::default();
        let result = service
            .process_query("hak tanah ulayat", &preferences)
            .await
            .expect("query should succeed");

        assert_eq!(result.original_query, "hak tanah ulayat");
        assert_eq!(result.documents.len(), 2);
        assert!(result.documents.len() <= preferences.clamped_max_results());
        assert!(!result.response.is_empty());
        assert!(!result.keywords.is_empty());
    }

    #[tokio::test]
    async fn searched_documents_are_retrievable_by_id() {
        let service = service(vec![doc("UU 5/1960", "isi dokumen agraria")]);

        let documents = service
            .document_service()
            .search_documents("agraria", 1, 10)
            .await
            .expect("search should succeed");

        let id = documents[0].metadata["doc_id"]
            .as_str()
            .expect("id assigned");
        let fetched = service
            .document_service()
            .document_by_id(id)
            .await
            .expect("stored document is retrievable");
        assert_eq!(fetched.content, "isi dokumen agraria");
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_fetch() {
        let service = service(Vec::new());
        let error = service
            .process_query("   ", &UserPreferences::default())
            .await
            .expect_err("blank query must fail");
        assert!(matches!(error, ServiceError::EmptyQuery));
        assert_eq!(error.category(), ErrorCategory::InvalidInput);
    }

    #[tokio::test]
    async fn unknown_document_id_is_not_found() {
        let service = service(Vec::new());
        let error = service
            .document_service()
            .document_by_id("doc-never-issued")
            .await
            .expect_err("unknown id must fail");
        assert!(matches!(error, ServiceError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn no_results_yields_the_fixed_sentence() {
        let service = service(Vec::new());
        let result = service
            .process_query("topik tanpa hasil", &UserPreferences::default())
            .await
            .expect("empty result set is not an error");
        assert!(result.documents.is_empty());
        assert!(result.response.contains("couldn't find"));
    }
}
