use thiserror::Error;

/// Failures of the outer scraping orchestration. Per-page and per-item
/// problems are logged and skipped inside the loop; only these escape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("scrape failed: {0}")]
    Request(String),
}

/// Errors surfaced at the service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("query cannot be empty")]
    EmptyQuery,

    #[error("document with id {0} not found")]
    DocumentNotFound(String),

    #[error("scraper error: {0}")]
    Scraper(#[from] ScrapeError),

    #[error("generation error: {0}")]
    Generation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-facing classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    NotFound,
    Upstream,
}

impl ServiceError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServiceError::EmptyQuery => ErrorCategory::InvalidInput,
            ServiceError::DocumentNotFound(_) => ErrorCategory::NotFound,
            ServiceError::Scraper(_) | ServiceError::Generation(_) | ServiceError::Io(_) => {
                ErrorCategory::Upstream
            }
        }
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ErrorCategory, ServiceError};

    #[test]
    fn categories_map_to_client_facing_kinds() {
        assert_eq!(
            ServiceError::EmptyQuery.category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            ServiceError::DocumentNotFound("doc-1".to_string()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ServiceError::Generation("model refused".to_string()).category(),
            ErrorCategory::Upstream
        );
    }

    #[test]
    fn not_found_message_identifies_the_id() {
        let error = ServiceError::DocumentNotFound("doc-abc123".to_string());
        assert!(error.to_string().contains("doc-abc123"));
    }
}
