/// Per-term relevance contribution
pub trait Scorer: Send + Sync {
    fn score(&self, term_freq: u32, idf: f32, doc_stats: &DocStats) -> f32;

    fn name(&self) -> &str;
}

/// Document statistics for scoring
#[derive(Debug, Clone)]
pub struct DocStats {
    pub doc_length: u32,    // Number of indexed tokens in document
    pub total_docs: u64,    // Documents in the text index
}

/// Smoothed inverse document frequency: ln((N + 1) / (df + 1)) + 1.
/// Always positive, so a matching term never lowers a score.
pub fn idf(total_docs: u64, doc_freq: u32) -> f32 {
    (((total_docs as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0) as f32
}

/// Raw term frequency times idf
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    fn score(&self, term_freq: u32, idf: f32, _doc_stats: &DocStats) -> f32 {
        term_freq as f32 * idf
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}
