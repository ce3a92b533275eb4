//! TF-IDF text vectorizer for catalog documents.
//!
//! Tokenization: lowercase, then runs of two or more word characters
//! (alphanumerics and `_`). English stop words are dropped before n-grams
//! are formed. Weights are raw term counts times the smoothed IDF
//! `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalised.
//!
//! The vocabulary is kept in alphabetical order, which makes the feature
//! columns stable across rebuilds of the same catalog.

use crate::sparse::CsrMatrix;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Standard English stop-word list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst",
    "amoungst", "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway",
    "anywhere", "are", "around", "as", "at", "back", "be", "became", "because", "become",
    "becomes", "becoming", "been", "before", "beforehand", "behind", "being", "below", "beside",
    "besides", "between", "beyond", "bill", "both", "bottom", "but", "by", "call", "can",
    "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de", "describe", "detail", "do",
    "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven", "else",
    "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five",
    "for", "former", "formerly", "forty", "found", "four", "from", "front", "full", "further",
    "get", "give", "go", "had", "has", "hasnt", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest", "into",
    "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover",
    "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither",
    "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
    "per", "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed",
    "seeming", "seems", "serious", "several", "she", "should", "show", "side", "since",
    "sincere", "six", "sixty", "so", "some", "somehow", "someone", "something", "sometime",
    "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "thick", "thin", "third", "this",
    "those", "though", "three", "through", "throughout", "thru", "thus", "to", "together", "too",
    "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up", "upon",
    "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Split text into lowercase tokens of at least two word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '_' {
            current.push(c);
            len += 1;
        } else {
            if len >= 2 {
                tokens.push(std::mem::take(&mut current));
            }
            current.clear();
            len = 0;
        }
    }
    if len >= 2 {
        tokens.push(current);
    }
    tokens
}

/// Fit-once TF-IDF vectorizer.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    max_features: Option<usize>,
    ngram_range: (usize, usize),
    min_df: usize,
    max_df: f32,
    stop_words: HashSet<&'static str>,
    vocabulary: Vec<String>,
    idf: Vec<f32>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfidfVectorizer {
    /// Unigrams, no vocabulary cap, no document-frequency pruning.
    pub fn new() -> Self {
        Self {
            max_features: None,
            ngram_range: (1, 1),
            min_df: 1,
            max_df: 1.0,
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            vocabulary: Vec::new(),
            idf: Vec::new(),
        }
    }

    /// Keep at most `max_features` terms, ranked by corpus term frequency.
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Drop terms appearing in fewer than `min_df` documents.
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.min_df = min_df.max(1);
        self
    }

    /// Drop terms appearing in more than this fraction of documents.
    pub fn with_max_df(mut self, max_df: f32) -> Self {
        self.max_df = max_df.clamp(0.0, 1.0);
        self
    }

    /// Fitted vocabulary in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Fitted IDF weight per column
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn feature_count(&self) -> usize {
        self.vocabulary.len()
    }

    /// Stop-word filtering and n-gram expansion for one document.
    fn analyze(&self, document: &str) -> Vec<String> {
        let tokens: Vec<String> = tokenize(document)
            .into_iter()
            .filter(|t| !self.stop_words.contains(t.as_str()))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Learn the vocabulary and IDF weights, then return the TF-IDF matrix.
    ///
    /// If pruning leaves no terms the result has zero columns.
    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> CsrMatrix {
        let n_docs = documents.len();

        let doc_counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| {
                let mut counts = HashMap::new();
                for term in self.analyze(doc.as_ref()) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        // term -> (corpus term frequency, document frequency), alphabetical
        let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for counts in &doc_counts {
            for (term, &count) in counts {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += count;
                entry.1 += 1;
            }
        }

        let max_doc_count = self.max_df * n_docs as f32;
        let mut kept: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .filter(|&(_, (_, df))| df >= self.min_df && df as f32 <= max_doc_count)
            .map(|(term, (tf, df))| (term, tf, df))
            .collect();

        if let Some(limit) = self.max_features {
            if kept.len() > limit {
                kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                kept.truncate(limit);
                kept.sort_by(|a, b| a.0.cmp(b.0));
            }
        }

        let smoothed_n = (1 + n_docs) as f32;
        self.vocabulary = kept.iter().map(|(term, _, _)| term.to_string()).collect();
        self.idf = kept
            .iter()
            .map(|&(_, _, df)| (smoothed_n / (1 + df) as f32).ln() + 1.0)
            .collect();

        debug!(
            "TF-IDF fitted on {} documents, {} features",
            n_docs,
            self.vocabulary.len()
        );

        let columns: HashMap<&str, usize> = self
            .vocabulary
            .iter()
            .enumerate()
            .map(|(col, term)| (term.as_str(), col))
            .collect();

        let rows: Vec<Vec<(usize, f32)>> = doc_counts
            .iter()
            .map(|counts| {
                let mut row: Vec<(usize, f32)> = counts
                    .iter()
                    .filter_map(|(term, &count)| {
                        columns
                            .get(term.as_str())
                            .map(|&col| (col, count as f32 * self.idf[col]))
                    })
                    .collect();
                // Fixed summation order keeps rebuilds bit-identical
                row.sort_unstable_by_key(|&(col, _)| col);
                let norm = row.iter().map(|(_, v)| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for (_, v) in row.iter_mut() {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();

        CsrMatrix::from_rows(self.vocabulary.len(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Action, Sci-Fi; highly_rated a 42"),
            vec!["action", "sci", "fi", "highly_rated", "42"]
        );
        assert!(tokenize("a b ,;").is_empty());
    }

    #[test]
    fn test_stop_words_removed_before_bigrams() {
        let v = TfidfVectorizer::new().with_ngram_range(1, 2);
        assert_eq!(
            v.analyze("drama and comedy"),
            vec!["drama", "comedy", "drama comedy"]
        );
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let mut v = TfidfVectorizer::new();
        let m = v.fit_transform(&["zombie horror", "animation family"]);
        assert_eq!(v.vocabulary(), &["animation", "family", "horror", "zombie"]);
        assert_eq!(m.shape(), (2, 4));
    }

    #[test]
    fn test_smoothed_idf() {
        let mut v = TfidfVectorizer::new();
        v.fit_transform(&["drama", "drama comedy", "comedy"]);
        // df = 2 of 3 for both terms
        let expected = (4.0f32 / 3.0).ln() + 1.0;
        assert!((v.idf()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_rows_are_l2_normalised() {
        let mut v = TfidfVectorizer::new().with_ngram_range(1, 2);
        let m = v.fit_transform(&["action thriller action", "romance", "action romance"]);
        for row in 0..m.n_rows() {
            assert!((m.row_norm(row) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_max_df_prunes_ubiquitous_terms() {
        let mut v = TfidfVectorizer::new().with_max_df(0.95);
        v.fit_transform(&["movie drama", "movie comedy", "movie horror"]);
        assert!(!v.vocabulary().iter().any(|t| t == "movie"));
        assert_eq!(v.feature_count(), 3);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TfidfVectorizer::new().with_max_features(2);
        v.fit_transform(&["drama drama comedy", "drama horror", "comedy western"]);
        assert_eq!(v.vocabulary(), &["comedy", "drama"]);
    }

    #[test]
    fn test_everything_pruned_gives_zero_columns() {
        let mut v = TfidfVectorizer::new().with_max_df(0.5);
        let m = v.fit_transform(&["movie", "movie", "movie"]);
        assert_eq!(m.shape(), (3, 0));
        assert_eq!(m.nnz(), 0);
    }
}
