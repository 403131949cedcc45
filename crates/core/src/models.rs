use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub type Metadata = Map<String, Value>;

/// A scraped legal document. Content is fixed at construction; metadata
/// is annotated downstream (id assignment, relevance score).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Build a Document from a loose JSON object. Accepts `page_content`
    /// as an alias for `content`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let content = object
            .get("page_content")
            .or_else(|| object.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let metadata = object
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Some(Self { content, metadata })
    }

    pub fn to_value(&self) -> Value {
        json!({
            "content": self.content,
            "metadata": Value::Object(self.metadata.clone()),
        })
    }

    pub fn title(&self) -> &str {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Untitled Document")
    }

    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("Unknown source")
    }

    pub fn doc_type(&self) -> &str {
        self.metadata
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
    }

    pub fn relevance_score(&self) -> Option<f64> {
        self.metadata.get("relevance_score").and_then(Value::as_f64)
    }
}

/// How wordy the synthesised answer should be.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    #[default]
    Detailed,
    Comprehensive,
}

/// Register of the synthesised answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Simple,
    Legal,
    Technical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default)]
    pub format: ResponseFormat,
    #[serde(default = "default_citations")]
    pub citations: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_citations() -> bool {
    true
}

fn default_max_results() -> usize {
    10
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            format: ResponseFormat::default(),
            citations: true,
            max_results: default_max_results(),
        }
    }
}

impl UserPreferences {
    /// Keep the result cap inside the supported 1..=50 window.
    pub fn clamped_max_results(&self) -> usize {
        self.max_results.clamp(1, 50)
    }
}

/// Outcome of one processed query, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub original_query: String,
    pub keywords: Vec<String>,
    pub documents: Vec<Value>,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl SearchResult {
    pub fn new(
        original_query: impl Into<String>,
        keywords: Vec<String>,
        documents: &[Document],
        response: impl Into<String>,
    ) -> Self {
        Self {
            original_query: original_query.into(),
            keywords,
            documents: documents.iter().map(Document::to_value).collect(),
            response: response.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, UserPreferences, Verbosity};
    use serde_json::json;

    #[test]
    fn from_value_round_trips_content_and_metadata() {
        let value = json!({
            "content": "Pasal 1",
            "metadata": {"title": "UU 5/1960"},
        });

        let document = Document::from_value(&value).expect("object should convert");
        assert_eq!(document.content, "Pasal 1");
        assert_eq!(document.metadata["title"], json!("UU 5/1960"));
        assert_eq!(document.to_value(), value);
    }

    #[test]
    fn from_value_accepts_page_content_alias() {
        let value = json!({
            "page_content": "Pasal 2",
            "metadata": {},
        });

        let document = Document::from_value(&value).expect("object should convert");
        assert_eq!(document.content, "Pasal 2");
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Document::from_value(&json!("just a string")).is_none());
    }

    #[test]
    fn preferences_default_to_detailed_with_citations() {
        let preferences = UserPreferences::default();
        assert_eq!(preferences.verbosity, Verbosity::Detailed);
        assert!(preferences.citations);
        assert_eq!(preferences.max_results, 10);
    }

    #[test]
    fn max_results_is_clamped_to_supported_window() {
        let preferences = UserPreferences {
            max_results: 500,
            ..UserPreferences::default()
        };
        assert_eq!(preferences.clamped_max_results(), 50);

        let preferences = UserPreferences {
            max_results: 0,
            ..UserPreferences::default()
        };
        assert_eq!(preferences.clamped_max_results(), 1);
    }
}
