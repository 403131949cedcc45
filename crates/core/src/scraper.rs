use crate::error::ScrapeError;
use crate::extract::{self, PdfLink, ResultItem};
use crate::fetch::HtmlFetcher;
use crate::models::{Document, Metadata};
use crate::pdf::PdfExtractor;
use crate::rank::RelevanceRanker;
use crate::text::TextEnhancer;
use crate::traits::Searcher;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://peraturan.bpk.go.id";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Orchestrates the scraping pipeline against peraturan.bpk.go.id:
/// query enhancement, the paginated HTML pass with per-item PDF
/// fallback, the PDF-only pass, and final relevance ranking.
pub struct BpkScraper {
    fetcher: HtmlFetcher,
    pdf: PdfExtractor,
    enhancer: TextEnhancer,
    ranker: RelevanceRanker,
    base_url: Url,
}

impl BpkScraper {
    pub fn new(
        config: ScraperConfig,
        enhancer: TextEnhancer,
        pdf: PdfExtractor,
        ranker: RelevanceRanker,
    ) -> Result<Self, ScrapeError> {
        let base_url = Url::parse(&config.base_url)?;
        let fetcher = HtmlFetcher::new(config.timeout)?;

        info!(base_url = %base_url, "bpk scraper initialised");
        Ok(Self {
            fetcher,
            pdf,
            enhancer,
            ranker,
            base_url,
        })
    }

    /// Enhance the user query with stemmed variants and related legal
    /// terminology. Always returns a usable query string.
    pub fn preprocess_query(&self, query: &str) -> String {
        let enhanced = self.enhancer.enhance(query);
        if enhanced != query {
            info!(query, enhanced, "query enhanced");
        }
        enhanced
    }

    /// Paginated HTML pass. Per-page and per-item failures are logged
    /// and skipped; pagination stops when a page yields no items or no
    /// next-page control.
    pub async fn scrape_html(&self, enhanced_query: &str, max_pages: usize) -> Vec<Document> {
        let search_url = format!("{}Search", self.base_url);
        let mut documents = Vec::new();

        for page in 1..=max_pages {
            let mut params = vec![("keywords", enhanced_query.to_string())];
            if page > 1 {
                params.push(("page", page.to_string()));
            }

            let Some(body) = self.fetcher.fetch_text(&search_url, &params).await else {
                warn!(page, "failed to fetch results page, skipping");
                continue;
            };

            let parsed = extract::parse_search_page(&body, &self.base_url);
            if parsed.items.is_empty() {
                info!(page, "no results found, stopping pagination");
                break;
            }
            info!(page, count = parsed.items.len(), "processing result items");

            for item in &parsed.items {
                if let Some(document) = self.fetch_detail_document(item, page).await {
                    documents.push(document);
                }
            }

            if !parsed.has_next {
                info!(page, "no more pages available");
                break;
            }
        }

        info!(count = documents.len(), "html pass complete");
        documents
    }

    /// Fetch one detail page and build a Document from its content,
    /// falling back to the first PDF link when HTML extraction fails.
    async fn fetch_detail_document(&self, item: &ResultItem, page: usize) -> Option<Document> {
        let Some(body) = self.fetcher.fetch_text(item.link.as_str(), &[]).await else {
            warn!(link = %item.link, "failed to fetch detail page, skipping item");
            return None;
        };

        if let Some(content) = extract::extract_main_content(&body) {
            info!(title = %item.title, chars = content.len(), "added document");
            return Some(Document::new(content, item_metadata(item, page, None)));
        }

        warn!(title = %item.title, "could not extract sufficient content, trying pdf links");
        let pdf_links = extract::find_pdf_links(&body, &item.link);
        let first = pdf_links.first()?;

        let (content, pdf_metadata) = self
            .pdf
            .download_and_extract(&first.url, &item.title)
            .await?;

        let mut metadata = item_metadata(item, page, Some(&pdf_metadata));
        metadata.insert("source".to_string(), json!(first.url));
        metadata.insert(
            "type".to_string(),
            json!(format!("{} (PDF)", item.doc_type)),
        );

        info!(title = %item.title, chars = content.len(), "added pdf fallback document");
        Some(Document::new(content, metadata))
    }

    /// PDF-only pass: scan each results page for `.pdf` anchors,
    /// deduplicated by URL across pages, and extract each one.
    pub async fn search_pdfs(
        &self,
        query: &str,
        enhanced_query: &str,
        max_pages: usize,
    ) -> Vec<Document> {
        if !self.pdf.is_available() {
            warn!("pdf reader unavailable, skipping pdf search");
            return Vec::new();
        }

        let mut documents = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        for page in 1..=max_pages {
            let page_url = format!(
                "{}Search/Results?query={}&page={}",
                self.base_url,
                enhanced_query.replace(' ', "+"),
                page
            );

            let Some(body) = self.fetcher.fetch_text(&page_url, &[]).await else {
                warn!(page, "failed to fetch pdf results page, skipping");
                continue;
            };

            let Ok(parsed_page_url) = Url::parse(&page_url) else {
                continue;
            };

            for link in extract::find_pdf_links(&body, &parsed_page_url) {
                if !processed.insert(link.url.clone()) {
                    continue;
                }

                let Some((content, mut metadata)) =
                    self.pdf.download_and_extract(&link.url, &link.text).await
                else {
                    continue;
                };

                annotate_pdf_metadata(&mut metadata, query, enhanced_query, &link);
                info!(title = %link.text, "added pdf document");
                documents.push(Document::new(content, metadata));
            }
        }

        info!(count = documents.len(), "pdf pass complete");
        documents
    }

    /// The full search: enhancement, both passes, rerank, truncate.
    pub async fn search_documents(
        &self,
        query: &str,
        max_pages: usize,
        max_results: usize,
    ) -> Result<Vec<Document>, ScrapeError> {
        info!(query, max_pages, max_results, "searching for documents");

        let enhanced = self.preprocess_query(query);

        let mut documents = self.scrape_html(&enhanced, max_pages).await;
        documents.extend(self.search_pdfs(query, &enhanced, max_pages).await);

        let mut documents = self.ranker.rank(query, documents);
        documents.truncate(max_results);

        if documents.is_empty() {
            warn!(query, "no documents found");
        } else {
            info!(count = documents.len(), "documents found");
        }

        Ok(documents)
    }
}

#[async_trait]
impl Searcher for BpkScraper {
    async fn search(
        &self,
        query: &str,
        max_pages: usize,
        max_results: usize,
    ) -> Result<Vec<Document>, ScrapeError> {
        self.search_documents(query, max_pages, max_results).await
    }
}

fn item_metadata(item: &ResultItem, page: usize, pdf_metadata: Option<&Metadata>) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("title".to_string(), json!(item.title));
    metadata.insert("source".to_string(), json!(item.link.as_str()));
    metadata.insert("type".to_string(), json!(item.doc_type));
    metadata.insert("date".to_string(), json!(item.date));
    metadata.insert("preview".to_string(), json!(item.preview));
    metadata.insert("page".to_string(), json!(page));
    if let Some(pdf_metadata) = pdf_metadata {
        metadata.insert(
            "pdf_metadata".to_string(),
            Value::Object(pdf_metadata.clone()),
        );
    }
    metadata
}

fn annotate_pdf_metadata(metadata: &mut Metadata, query: &str, enhanced: &str, link: &PdfLink) {
    metadata.insert("query".to_string(), json!(query));
    metadata.insert("enhanced_query".to_string(), json!(enhanced));
    metadata.insert("link_text".to_string(), json!(link.text));
    metadata.insert("source_page".to_string(), json!(link.source_page));
}

#[cfg(test)]
mod tests {
    use super::{BpkScraper, ScraperConfig};
    use crate::pdf::PdfExtractor;
    use crate::rank::RelevanceRanker;
    use crate::text::TextEnhancer;

    fn scraper() -> BpkScraper {
        BpkScraper::new(
            ScraperConfig::default(),
            TextEnhancer::default(),
            PdfExtractor::disabled(),
            RelevanceRanker::disabled(),
        )
        .expect("default config is valid")
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = ScraperConfig {
            base_url: "not a url".to_string(),
            ..ScraperConfig::default()
        };
        let result = BpkScraper::new(
            config,
            TextEnhancer::default(),
            PdfExtractor::disabled(),
            RelevanceRanker::disabled(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn preprocess_expands_known_legal_roots() {
        let scraper = scraper();
        let enhanced = scraper.preprocess_query("hak tanah ulayat");
        assert!(enhanced.starts_with("hak tanah ulayat"));
        assert!(enhanced.contains("hak asasi"));
    }

    #[tokio::test]
    async fn pdf_pass_is_empty_when_reader_is_disabled() {
        let scraper = scraper();
        let documents = scraper.search_pdfs("hak", "hak hak asasi", 2).await;
        assert!(documents.is_empty());
    }
}
