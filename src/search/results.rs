use std::collections::BinaryHeap;
use std::cmp::Ordering;
use std::sync::Arc;
use crate::core::types::Document;
use crate::query::planner::QueryPlan;

/// Document with its ranking signals
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Arc<Document>,
    pub score: Option<f32>,      // text relevance, when a text clause was present
    pub distance: Option<f64>,   // meters, when a geo clause was present
}

// Greater means ranked earlier: higher score, then shorter distance, then
// lower id. Missing signals compare equal to each other.
impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        let score = self.score.unwrap_or(0.0).total_cmp(&other.score.unwrap_or(0.0));
        let distance = other.distance.unwrap_or(0.0).total_cmp(&self.distance.unwrap_or(0.0));
        score
            .then(distance)
            .then_with(|| other.document.id.cmp(&self.document.id))
    }
}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

/// Ranked matches of one query.
///
/// Hits are heapified once and popped on demand, so taking the first `k`
/// costs O(n + k log n). Iteration honours the query's skip and limit.
#[derive(Debug)]
pub struct SearchResults {
    heap: BinaryHeap<ScoredDocument>,
    pub total_hits: usize,
    pub plan: QueryPlan,
    pub took_ms: u64,
    skip: usize,
    remaining: Option<usize>,
}

impl SearchResults {
    pub fn new(hits: Vec<ScoredDocument>, plan: QueryPlan, skip: usize, limit: Option<usize>, took_ms: u64) -> Self {
        let total_hits = hits.len();
        SearchResults {
            heap: BinaryHeap::from(hits),
            total_hits,
            plan,
            took_ms,
            skip,
            remaining: limit,
        }
    }

    /// Remaining documents in rank order
    pub fn into_documents(self) -> Vec<Document> {
        self.map(|hit| Arc::unwrap_or_clone(hit.document)).collect()
    }
}

impl Iterator for SearchResults {
    type Item = ScoredDocument;

    fn next(&mut self) -> Option<ScoredDocument> {
        while self.skip > 0 {
            self.heap.pop()?;
            self.skip -= 1;
        }
        match self.remaining {
            Some(0) => None,
            Some(ref mut n) => {
                *n -= 1;
                self.heap.pop()
            }
            None => self.heap.pop(),
        }
    }
}
