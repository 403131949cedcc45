pub mod error;
pub mod extract;
pub mod fetch;
pub mod generate;
pub mod models;
pub mod pdf;
pub mod rank;
pub mod report;
pub mod scraper;
pub mod service;
pub mod store;
pub mod text;
pub mod traits;

pub use error::{ErrorCategory, ScrapeError, ServiceError};
pub use extract::{PdfLink, ResultItem, SearchPage};
pub use fetch::HtmlFetcher;
pub use generate::{respond, template_summary, ChatClient};
pub use models::{
    Document, Metadata, ResponseFormat, SearchResult, UserPreferences, Verbosity,
};
pub use pdf::PdfExtractor;
pub use rank::{cosine_similarity, CharacterNgramEmbedder, Embedder, RelevanceRanker};
pub use report::generate_html_report;
pub use scraper::{BpkScraper, ScraperConfig, DEFAULT_BASE_URL};
pub use service::{document_id, DocumentService, QueryService};
pub use store::MemoryStore;
pub use text::{Stemmer, TextEnhancer};
pub use traits::{DocumentStore, Searcher};
