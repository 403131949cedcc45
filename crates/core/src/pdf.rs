use crate::models::Metadata;
use lopdf::{Document as PdfDocument, Object};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Downloads PDFs to a scoped temporary file and extracts per-page text
/// plus string metadata. Every failure path yields `None`: a missing or
/// unreadable PDF is "no PDF available", never an error for the caller.
pub struct PdfExtractor {
    client: reqwest::Client,
    available: bool,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_DOWNLOAD_TIMEOUT)
    }
}

impl PdfExtractor {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            available: true,
        }
    }

    /// Degraded mode without a PDF reader; extraction always reports
    /// "no PDF available".
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            available: false,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Download a PDF and return `(content, metadata)`, or `None` when
    /// anything fails. The temporary file is removed on every exit path.
    pub async fn download_and_extract(
        &self,
        pdf_url: &str,
        title: &str,
    ) -> Option<(String, Metadata)> {
        if !self.available {
            warn!("pdf reader disabled, cannot extract content");
            return None;
        }

        info!(url = pdf_url, "downloading pdf");
        let response = match self.client.get(pdf_url).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(url = pdf_url, %error, "pdf download failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url = pdf_url, status = %response.status(), "pdf download rejected");
            return None;
        }
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(url = pdf_url, %error, "pdf body read failed");
                return None;
            }
        };

        self.extract_from_binary(&bytes, pdf_url, title)
    }

    /// Extract from an in-memory PDF payload via a scoped temp file.
    pub fn extract_from_binary(
        &self,
        payload: &[u8],
        source: &str,
        title: &str,
    ) -> Option<(String, Metadata)> {
        if !self.available {
            warn!("pdf reader disabled, cannot extract content");
            return None;
        }

        // NamedTempFile deletes itself on drop, including error returns.
        let mut temp = match tempfile::Builder::new().suffix(".pdf").tempfile() {
            Ok(temp) => temp,
            Err(error) => {
                warn!(%error, "could not create temp pdf file");
                return None;
            }
        };
        if let Err(error) = temp.write_all(payload) {
            warn!(%error, "could not write temp pdf file");
            return None;
        }

        let document = match PdfDocument::load(temp.path()) {
            Ok(document) => document,
            Err(error) => {
                warn!(source, %error, "pdf parse failed");
                return None;
            }
        };

        let pages = document.get_pages();
        let mut content = String::new();
        for (index, (page_number, _)) in pages.iter().enumerate() {
            let page_text = match document.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(error) => {
                    warn!(source, page = index + 1, %error, "page text extraction failed");
                    continue;
                }
            };
            if !page_text.trim().is_empty() {
                content.push_str(&format!("\n--- Page {} ---\n", index + 1));
                content.push_str(&page_text);
            }
        }

        if content.trim().is_empty() {
            warn!(source, "pdf had no readable page text");
            return None;
        }

        let title = if title.is_empty() {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            title
        };

        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), json!(source));
        metadata.insert("title".to_string(), json!(title));
        metadata.insert("pages".to_string(), json!(pages.len()));
        metadata.insert("type".to_string(), json!("pdf"));
        for (key, value) in info_dictionary_strings(&document) {
            metadata.entry(key).or_insert(json!(value));
        }

        info!(source, pages = pages.len(), "pdf extracted");
        Some((content, metadata))
    }
}

/// String-valued entries of the PDF info dictionary, keys lowercased
/// (the PDF-spec name prefix is already stripped by the parser).
fn info_dictionary_strings(document: &PdfDocument) -> Vec<(String, String)> {
    let mut entries = Vec::new();

    let Ok(info) = document.trailer.get(b"Info") else {
        return entries;
    };
    let info = match info {
        Object::Reference(id) => match document.get_object(*id) {
            Ok(object) => object,
            Err(_) => return entries,
        },
        other => other,
    };
    let Ok(dictionary) = info.as_dict() else {
        return entries;
    };

    for (key, value) in dictionary.iter() {
        if let Object::String(bytes, _) = value {
            let key = String::from_utf8_lossy(key).to_lowercase();
            let value = String::from_utf8_lossy(bytes).to_string();
            entries.push((key, value));
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::PdfExtractor;

    #[tokio::test]
    async fn disabled_extractor_returns_none_without_raising() {
        let extractor = PdfExtractor::disabled();
        assert!(!extractor.is_available());
        let result = extractor
            .download_and_extract("https://example.com/doc.pdf", "Doc")
            .await;
        assert!(result.is_none());
    }

    #[test]
    fn corrupt_payload_returns_none() {
        let extractor = PdfExtractor::default();
        let result = extractor.extract_from_binary(b"%PDF-1.4\n%broken", "mem", "Broken");
        assert!(result.is_none());
    }
}
