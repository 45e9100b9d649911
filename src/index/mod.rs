pub mod key;
pub mod definition;
pub mod posting;
pub mod ordered;
pub mod multikey;
pub mod text;
pub mod geo;
pub mod manager;

use serde::{Serialize, Deserialize};
use crate::core::error::Result;
use crate::core::types::{DocId, Document};
use crate::index::definition::{IndexDefinition, IndexKind};

/// Common surface of every secondary structure the manager maintains
pub trait SecondaryIndex: Send + Sync {
    fn definition(&self) -> &IndexDefinition;

    /// Fails if inserting `doc` would break a constraint. A document
    /// never conflicts with its own previous entries.
    fn check_insert(&self, _doc: &Document) -> Result<()> {
        Ok(())
    }

    /// Replaces any entries previously recorded for `doc.id`
    fn insert(&mut self, doc: &Document) -> Result<()>;

    fn remove(&mut self, doc: &Document);

    fn contains(&self, doc_id: DocId) -> bool;

    fn stats(&self) -> IndexStats;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub name: String,
    pub kind: IndexKind,
    pub documents: usize,     // documents with at least one entry
    pub entries: u64,
    pub distinct_keys: usize,
}
