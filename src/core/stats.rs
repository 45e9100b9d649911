use serde::{Serialize, Deserialize};
use crate::index::IndexStats;

/// Point-in-time counters of one collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub documents: usize,
    pub version: u64,
    pub queries: u64,
    pub writes: u64,
    pub indexes: Vec<IndexStats>,
}

/// Database statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub uptime_secs: u64,
    pub total_documents: usize,
    pub collections: Vec<CollectionStats>,
}
