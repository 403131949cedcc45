use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Optional stemming capability for Indonesian text. Constructed once at
/// startup and injected; absence degrades to the unstemmed query.
pub trait Stemmer: Send + Sync {
    fn stem(&self, word: &str) -> String;
}

/// Rule-based expansion of a query with related Indonesian legal terms,
/// with optional stemming in front.
pub struct TextEnhancer {
    stemmer: Option<Box<dyn Stemmer>>,
    legal_terms: HashMap<&'static str, &'static [&'static str]>,
}

impl Default for TextEnhancer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TextEnhancer {
    pub fn new(stemmer: Option<Box<dyn Stemmer>>) -> Self {
        Self {
            stemmer,
            legal_terms: legal_term_map(),
        }
    }

    pub fn has_stemmer(&self) -> bool {
        self.stemmer.is_some()
    }

    /// Stem every word longer than 3 characters, leaving short words as
    /// they are. Returns None when no stemmer is configured.
    fn stem_query(&self, query: &str) -> Option<String> {
        let stemmer = self.stemmer.as_ref()?;
        let stemmed = query
            .split_whitespace()
            .map(|word| {
                if word.chars().count() > 3 {
                    stemmer.stem(word)
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Some(stemmed)
    }

    /// Enhance a query: concatenate the stemmed variant when available,
    /// then append related legal terms for every root-term match that is
    /// not already substring-present in the original query.
    pub fn enhance(&self, query: &str) -> String {
        let stemmed = self.stem_query(query);

        let mut enhanced = match &stemmed {
            Some(variant) if variant != query => format!("{query} {variant}"),
            _ => query.to_string(),
        };

        let match_source = stemmed.unwrap_or_else(|| query.to_string()).to_lowercase();
        let mut related: BTreeSet<&str> = BTreeSet::new();
        for word in match_source.split_whitespace() {
            if let Some(terms) = self.legal_terms.get(word) {
                related.extend(terms.iter().copied());
            }
        }

        let query_lower = query.to_lowercase();
        for term in related {
            if !query_lower.contains(&term.to_lowercase()) {
                enhanced.push(' ');
                enhanced.push_str(term);
            }
        }

        enhanced
    }
}

fn legal_term_map() -> HashMap<&'static str, &'static [&'static str]> {
    let entries: &[(&str, &[&str])] = &[
        ("hak", &["hak", "hak asasi"]),
        ("ulayat", &["ulayat", "hak ulayat", "tanah ulayat", "tanah adat"]),
        ("tanah", &["tanah", "pertanahan", "agraria"]),
        ("adat", &["adat", "hukum adat", "masyarakat adat"]),
        ("hukum", &["hukum", "peraturan", "undang-undang"]),
        ("undang", &["undang-undang", "peraturan"]),
        ("peraturan", &["peraturan", "regulasi"]),
        ("pemerintah", &["pemerintah", "pemerintahan"]),
        ("keputusan", &["keputusan", "ketetapan"]),
        ("menteri", &["menteri", "kementerian"]),
        ("presiden", &["presiden", "kepresidenan"]),
        ("agraria", &["agraria", "pertanahan"]),
        ("pertanahan", &["pertanahan", "tanah"]),
        ("masyarakat", &["masyarakat", "komunitas"]),
        ("hutan", &["hutan", "kehutanan"]),
        ("wilayah", &["wilayah", "area", "kawasan"]),
        ("daerah", &["daerah", "area", "wilayah"]),
        ("provinsi", &["provinsi", "daerah"]),
        ("kabupaten", &["kabupaten", "daerah"]),
        ("kota", &["kota", "perkotaan"]),
    ];
    entries.iter().copied().collect()
}

/// Truncate to at most `max_length` characters, cutting at the last word
/// boundary and appending an ellipsis when anything was dropped.
pub fn truncate_text(text: &str, max_length: usize, add_ellipsis: bool) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_length).collect();
    if let Some(last_space) = truncated.rfind(' ') {
        if last_space > 0 {
            truncated.truncate(last_space);
        }
    }

    if add_ellipsis {
        truncated.push_str("...");
    }

    truncated
}

/// First `max_chars` characters of a string, respecting char boundaries.
pub fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn clean_html(html_text: &str) -> String {
    let tags = Regex::new(r"<[^>]+>").expect("static pattern");
    let without_tags = tags.replace_all(html_text, " ");
    normalize_whitespace(&without_tags)
}

/// Frequency-free keyword fallback: lowercase words longer than 3
/// characters, deduplicated in order of first appearance, first `n`.
pub fn simple_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .filter(|word| seen.insert(word.to_string()))
        .map(str::to_string)
        .take(max_keywords)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        clean_html, head_chars, normalize_whitespace, simple_keywords, truncate_text, Stemmer,
        TextEnhancer,
    };

    struct SuffixStemmer;

    impl Stemmer for SuffixStemmer {
        fn stem(&self, word: &str) -> String {
            word.trim_end_matches("nya").to_string()
        }
    }

    #[test]
    fn enhance_appends_related_terms_for_known_roots() {
        let enhancer = TextEnhancer::default();
        let enhanced = enhancer.enhance("hak tanah ulayat");

        for word in "hak tanah ulayat".split_whitespace() {
            assert!(enhanced.contains(word), "lost original word {word}");
        }
        assert!(enhanced.contains("hak asasi"));
        assert!(enhanced.contains("agraria"));
    }

    #[test]
    fn enhance_skips_terms_already_present() {
        let enhancer = TextEnhancer::default();
        let enhanced = enhancer.enhance("peraturan regulasi");
        let occurrences = enhanced.matches("regulasi").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn enhance_returns_query_unchanged_without_matches() {
        let enhancer = TextEnhancer::default();
        assert_eq!(enhancer.enhance("xyz abc"), "xyz abc");
    }

    #[test]
    fn enhance_concatenates_stemmed_variant() {
        let enhancer = TextEnhancer::new(Some(Box::new(SuffixStemmer)));
        let enhanced = enhancer.enhance("tanahnya");
        assert!(enhanced.starts_with("tanahnya tanah"));
    }

    #[test]
    fn truncate_is_noop_for_short_text() {
        assert_eq!(truncate_text("pendek", 100, true), "pendek");
    }

    #[test]
    fn truncate_respects_length_budget() {
        let text = "kata ".repeat(100);
        let truncated = truncate_text(&text, 50, true);
        assert!(truncated.chars().count() <= 53);
        assert!(truncated.ends_with("..."));

        let bare = truncate_text(&text, 50, false);
        assert!(bare.chars().count() <= 50);
    }

    #[test]
    fn head_chars_respects_utf8_boundaries() {
        assert_eq!(head_chars("héllo", 2), "hé");
        assert_eq!(head_chars("ab", 10), "ab");
    }

    #[test]
    fn whitespace_and_html_are_normalized() {
        assert_eq!(normalize_whitespace("  a \n b\t c "), "a b c");
        assert_eq!(clean_html("<p>Pasal <b>1</b></p>"), "Pasal 1");
    }

    #[test]
    fn simple_keywords_dedupes_and_limits() {
        let keywords = simple_keywords("Hukum tanah hukum adat di wilayah adat", 3);
        assert_eq!(keywords, vec!["hukum", "tanah", "adat"]);
    }
}
