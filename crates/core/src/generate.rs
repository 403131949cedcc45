use crate::error::ServiceError;
use crate::models::{Document, ResponseFormat, UserPreferences, Verbosity};
use crate::text::{head_chars, simple_keywords};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";
const DEFAULT_MODEL: &str = "qwen2.5-72b-instruct";

/// Text-generation capability over an OpenAI-compatible chat endpoint.
/// Absence of an API key is a flagged degraded mode, not an error.
pub struct ChatClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: 0.0,
            max_tokens: 2000,
        }
    }

    pub fn disabled() -> Self {
        Self::new(None, None, None, Duration::from_secs(60))
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a single-prompt chat completion and return the text.
    pub async fn invoke(&self, prompt: &str) -> Result<String, ServiceError> {
        let Some(api_key) = &self.api_key else {
            return Err(ServiceError::Generation(
                "generation capability unavailable".to_string(),
            ));
        };

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, "sending chat completion request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| ServiceError::Generation(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Generation(format!(
                "chat completion returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|error| ServiceError::Generation(error.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Generation("chat completion had no choices".to_string()))
    }

    /// Keyword extraction through the model, with the simple word-length
    /// fallback on absence or any failure.
    pub async fn extract_keywords(&self, query: &str, max_keywords: usize) -> Vec<String> {
        if !self.is_available() {
            return simple_keywords(query, max_keywords);
        }

        let prompt = format!(
            "As a legal expert in Indonesian law, extract the most important keywords from this \
             query that would be effective for searching on a legal document website.\n\n\
             Original query: {query}\n\n\
             Extract {max_keywords} specific keywords or phrases that are most relevant for \
             searching legal documents. Focus on legal terminology, document types, or specific \
             regulations.\n\n\
             Format your response as a comma-separated list of keywords only, without any \
             additional text."
        );

        match self.invoke(&prompt).await {
            Ok(response) => {
                let keywords: Vec<String> = response
                    .split(',')
                    .map(str::trim)
                    .filter(|keyword| !keyword.is_empty())
                    .map(str::to_string)
                    .collect();
                if keywords.is_empty() {
                    simple_keywords(query, max_keywords)
                } else {
                    keywords
                }
            }
            Err(error) => {
                warn!(%error, "keyword extraction failed, using simple fallback");
                simple_keywords(query, max_keywords)
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

fn verbosity_instruction(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Concise => {
            "Keep your response concise and to the point, focusing only on the most relevant information."
        }
        Verbosity::Detailed => {
            "Provide a detailed response that covers the main points from the documents."
        }
        Verbosity::Comprehensive => {
            "Provide a comprehensive response that thoroughly analyzes all relevant information from the documents."
        }
    }
}

fn format_instruction(format: ResponseFormat) -> &'static str {
    match format {
        ResponseFormat::Simple => {
            "Use simple, everyday language that a non-legal expert can understand."
        }
        ResponseFormat::Legal => {
            "Use proper legal terminology and formatting appropriate for legal professionals."
        }
        ResponseFormat::Technical => {
            "Use technical language and provide specific details about legal mechanisms and procedures."
        }
    }
}

fn citation_instruction(citations: bool) -> &'static str {
    if citations {
        "Include citations to specific documents and sections when making claims."
    } else {
        "Do not include formal citations in your response."
    }
}

fn build_prompt(query: &str, documents: &[Document], preferences: &UserPreferences) -> String {
    let mut summaries = String::new();
    for (index, document) in documents.iter().take(5).enumerate() {
        let preview = head_chars(&document.content, 1000);
        let ellipsis = if document.content.chars().count() > 1000 {
            "..."
        } else {
            ""
        };
        summaries.push_str(&format!(
            "Document {}: {}\nSource: {}\nPreview: {}{}\n",
            index + 1,
            document.title(),
            document.source(),
            preview,
            ellipsis,
        ));
    }

    format!(
        "As a legal expert in Indonesian law, answer the following query based on the provided \
         legal documents.\n\n\
         Original query: {query}\n\n\
         Retrieved documents:\n{summaries}\n\
         Instructions:\n\
         1. {}\n\
         2. {}\n\
         3. {}\n\
         4. Focus on directly answering the query based on the legal documents provided.\n\
         5. If the documents don't contain sufficient information to answer the query, \
         acknowledge this limitation.\n\
         6. Include specific references to regulations and documents where relevant.\n\n\
         Your response:",
        verbosity_instruction(preferences.verbosity),
        format_instruction(preferences.format),
        citation_instruction(preferences.citations),
    )
}

/// Deterministic fallback summary from the top 3 documents.
pub fn template_summary(query: &str, documents: &[Document]) -> String {
    let mut response = format!(
        "Based on the retrieved documents, here is information related to your query about \
         '{query}':\n\n"
    );

    for (index, document) in documents.iter().take(3).enumerate() {
        response.push_str(&format!(
            "Document {}: {} ({})\nSource: {}\n",
            index + 1,
            document.title(),
            document.doc_type(),
            document.source(),
        ));

        let preview = head_chars(&document.content, 200).replace('\n', " ");
        let ellipsis = if document.content.chars().count() > 200 {
            "..."
        } else {
            ""
        };
        response.push_str(&format!("Preview: {preview}{ellipsis}\n\n"));
    }

    response.push_str(
        "For more detailed information, please review the full documents in the search results.",
    );
    response
}

/// Synthesise the final answer: fixed sentence when nothing was found,
/// LLM-generated text when the capability is present, and the templated
/// summary on absence or any generation failure.
pub async fn respond(
    chat: &ChatClient,
    query: &str,
    documents: &[Document],
    preferences: &UserPreferences,
) -> String {
    if documents.is_empty() {
        return format!("I couldn't find any relevant legal documents for your query: '{query}'.");
    }

    if chat.is_available() {
        let prompt = build_prompt(query, documents, preferences);
        match chat.invoke(&prompt).await {
            Ok(response) => return response,
            Err(error) => {
                warn!(%error, "generation failed, using templated summary");
            }
        }
    }

    template_summary(query, documents)
}

#[cfg(test)]
mod tests {
    use super::{
        build_prompt, citation_instruction, format_instruction, respond, template_summary,
        verbosity_instruction, ChatClient,
    };
    use crate::models::{Document, Metadata, ResponseFormat, UserPreferences, Verbosity};
    use serde_json::json;

    fn doc(title: &str, content: &str) -> Document {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(title));
        metadata.insert("source".to_string(), json!("https://example.com/d"));
        metadata.insert("type".to_string(), json!("Undang-undang"));
        Document::new(content, metadata)
    }

    #[test]
    fn instruction_tables_cover_every_preference() {
        assert!(verbosity_instruction(Verbosity::Concise).contains("concise"));
        assert!(verbosity_instruction(Verbosity::Detailed).contains("detailed"));
        assert!(verbosity_instruction(Verbosity::Comprehensive).contains("comprehensive"));
        assert!(format_instruction(ResponseFormat::Legal).contains("legal terminology"));
        assert!(format_instruction(ResponseFormat::Technical).contains("technical"));
        assert!(format_instruction(ResponseFormat::Simple).contains("simple"));
        assert!(citation_instruction(true).contains("Include citations"));
        assert!(citation_instruction(false).starts_with("Do not"));
    }

    #[test]
    fn prompt_limits_documents_and_preview_length() {
        let long_content = "a".repeat(5000);
        let documents: Vec<Document> =
            (0..8).map(|i| doc(&format!("Doc {i}"), &long_content)).collect();
        let prompt = build_prompt("hak ulayat", &documents, &UserPreferences::default());

        assert!(prompt.contains("Document 5"));
        assert!(!prompt.contains("Document 6"));
        assert!(prompt.contains("hak ulayat"));
    }

    #[tokio::test]
    async fn respond_without_documents_returns_fixed_sentence() {
        let chat = ChatClient::disabled();
        let answer = respond(&chat, "hak tanah ulayat", &[], &UserPreferences::default()).await;
        assert!(answer.contains("hak tanah ulayat"));
        assert!(answer.contains("couldn't find"));
    }

    #[tokio::test]
    async fn respond_degrades_to_templated_summary() {
        let chat = ChatClient::disabled();
        let documents = vec![doc("UU 5/1960", &"isi ".repeat(100))];
        let answer = respond(&chat, "agraria", &documents, &UserPreferences::default()).await;
        assert!(answer.contains("UU 5/1960"));
        assert!(answer.contains("agraria"));
    }

    #[test]
    fn template_summary_uses_first_three_documents() {
        let documents: Vec<Document> = (0..5)
            .map(|i| doc(&format!("Dokumen {i}"), "short content"))
            .collect();
        let summary = template_summary("hukum adat", &documents);
        assert!(summary.contains("Dokumen 2"));
        assert!(!summary.contains("Dokumen 3"));
    }

    #[tokio::test]
    async fn unavailable_client_rejects_invoke_with_generation_error() {
        let chat = ChatClient::disabled();
        let error = chat.invoke("prompt").await.expect_err("must fail");
        assert!(error.to_string().contains("generation"));
    }

    #[tokio::test]
    async fn keyword_extraction_falls_back_to_simple() {
        let chat = ChatClient::disabled();
        let keywords = chat.extract_keywords("hak tanah ulayat adat", 3).await;
        assert_eq!(keywords, vec!["tanah", "ulayat", "adat"]);
    }
}
