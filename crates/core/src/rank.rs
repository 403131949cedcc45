use crate::models::Document;
use crate::text::head_chars;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_DIMENSIONS: usize = 128;

/// Embedding capability: given text, return a fixed-width vector.
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Deterministic offline embedder hashing character trigrams into a
/// fixed number of buckets, L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct CharacterNgramEmbedder {
    pub dimensions: usize,
}

impl Default for CharacterNgramEmbedder {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl Embedder for CharacterNgramEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

/// Cosine similarity clamped to [0, 1]; zero vectors score 0.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() {
        return 0.0;
    }

    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let norm_left: f32 = left.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_right: f32 = right.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm_left == 0.0 || norm_right == 0.0 {
        return 0.0;
    }

    (dot / (norm_left * norm_right)).clamp(0.0, 1.0)
}

/// Reranks documents against a query when an embedding capability is
/// present; identity fallback otherwise.
#[derive(Clone, Default)]
pub struct RelevanceRanker {
    embedder: Option<Arc<dyn Embedder>>,
}

impl RelevanceRanker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Some(embedder),
        }
    }

    /// Degraded mode: [`RelevanceRanker::rank`] returns its input
    /// unchanged.
    pub fn disabled() -> Self {
        Self { embedder: None }
    }

    pub fn is_available(&self) -> bool {
        self.embedder.is_some()
    }

    /// Score each document's first 1000 characters against the query,
    /// annotate `relevance_score`, and stable-sort descending. Missing
    /// scores default to 0.0, so ties and unscored documents keep their
    /// original relative order.
    pub fn rank(&self, query: &str, mut documents: Vec<Document>) -> Vec<Document> {
        let Some(embedder) = &self.embedder else {
            warn!("embedder unavailable, returning documents unranked");
            return documents;
        };
        if documents.is_empty() {
            return documents;
        }

        let query_vector = embedder.embed(query);
        for document in &mut documents {
            let text = head_chars(&document.content, 1000);
            let score = if text.is_empty() {
                0.0
            } else {
                cosine_similarity(&query_vector, &embedder.embed(text))
            };
            document
                .metadata
                .insert("relevance_score".to_string(), json!(score));
        }

        documents.sort_by(|left, right| {
            let left_score = left.relevance_score().unwrap_or(0.0);
            let right_score = right.relevance_score().unwrap_or(0.0);
            right_score
                .partial_cmp(&left_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(count = documents.len(), "documents ranked by relevance");
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::{cosine_similarity, CharacterNgramEmbedder, Embedder, RelevanceRanker};
    use crate::models::Document;
    use std::sync::Arc;

    fn doc(content: &str) -> Document {
        Document::new(content, Default::default())
    }

    #[test]
    fn embedder_is_deterministic_and_sized() {
        let embedder = CharacterNgramEmbedder::default();
        let first = embedder.embed("hak ulayat masyarakat adat");
        let second = embedder.embed("hak ulayat masyarakat adat");
        assert_eq!(first, second);
        assert_eq!(first.len(), embedder.dimensions());
    }

    #[test]
    fn cosine_is_clamped_and_zero_safe() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn rank_on_empty_list_returns_empty() {
        let ranker = RelevanceRanker::new(Arc::new(CharacterNgramEmbedder::default()));
        assert!(ranker.rank("hak tanah", Vec::new()).is_empty());
    }

    #[test]
    fn unavailable_ranker_is_identity() {
        let ranker = RelevanceRanker::disabled();
        let documents = vec![doc("pertama"), doc("kedua"), doc("ketiga")];
        let ranked = ranker.rank("hak tanah", documents.clone());
        assert_eq!(ranked, documents);
        assert!(ranked[0].relevance_score().is_none());
    }

    #[test]
    fn rank_sorts_descending_and_annotates_scores() {
        let ranker = RelevanceRanker::new(Arc::new(CharacterNgramEmbedder::default()));
        let query = "hak ulayat tanah adat";
        let documents = vec![
            doc("prosedur administrasi perkantoran umum dan tata usaha"),
            doc("hak ulayat tanah adat masyarakat hukum adat"),
        ];

        let ranked = ranker.rank(query, documents);
        let scores: Vec<f64> = ranked
            .iter()
            .map(|d| d.relevance_score().expect("score annotated"))
            .collect();

        assert!(scores[0] >= scores[1]);
        assert!(ranked[0].content.contains("hak ulayat"));
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
