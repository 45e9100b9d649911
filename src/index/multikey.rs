use std::collections::{BTreeMap, HashMap};
use roaring::RoaringTreemap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::index::definition::IndexDefinition;
use crate::index::key::IndexKey;
use crate::index::{IndexStats, SecondaryIndex};

/// Index over an array field with one entry per distinct element.
/// A scalar value is treated as a one-element array.
pub struct MultikeyIndex {
    pub definition: IndexDefinition,
    pub field: String,
    pub entries: BTreeMap<IndexKey, RoaringTreemap>,
    pub contributed: HashMap<DocId, Vec<IndexKey>>,
}

impl MultikeyIndex {
    pub fn new(definition: IndexDefinition) -> Self {
        let field = definition.fields.first()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        MultikeyIndex {
            definition,
            field,
            entries: BTreeMap::new(),
            contributed: HashMap::new(),
        }
    }

    fn keys_for(&self, doc: &Document) -> Vec<IndexKey> {
        IndexKey::expand(doc.get_field(&self.field))
    }

    pub fn lookup(&self, key: &IndexKey) -> RoaringTreemap {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    pub fn estimate(&self, key: &IndexKey) -> u64 {
        self.entries.get(key).map(|ids| ids.len()).unwrap_or(0)
    }
}

impl SecondaryIndex for MultikeyIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    fn check_insert(&self, doc: &Document) -> Result<()> {
        if !self.definition.unique {
            return Ok(());
        }
        for key in self.keys_for(doc).iter().filter(|k| !k.is_null()) {
            let taken = self.entries.get(key)
                .and_then(|ids| ids.iter().find(|id| *id != doc.id.0));
            if let Some(existing) = taken {
                return Err(Error::new(
                    ErrorKind::UniqueConstraintViolation,
                    format!(
                        "duplicate key in index '{}' on ({}): {} already used by document {}",
                        self.definition.name, self.field, key, existing
                    ),
                ));
            }
        }
        Ok(())
    }

    fn insert(&mut self, doc: &Document) -> Result<()> {
        if self.contributed.contains_key(&doc.id) {
            self.remove(doc);
        }
        let keys = self.keys_for(doc);
        for key in &keys {
            self.entries.entry(key.clone()).or_default().insert(doc.id.0);
        }
        self.contributed.insert(doc.id, keys);
        Ok(())
    }

    fn remove(&mut self, doc: &Document) {
        let Some(keys) = self.contributed.remove(&doc.id) else {
            return;
        };
        for key in keys {
            if let Some(ids) = self.entries.get_mut(&key) {
                ids.remove(doc.id.0);
                if ids.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    fn contains(&self, doc_id: DocId) -> bool {
        self.contributed.contains_key(&doc_id)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            name: self.definition.name.clone(),
            kind: self.definition.kind,
            documents: self.contributed.len(),
            entries: self.contributed.values().map(|keys| keys.len() as u64).sum(),
            distinct_keys: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FieldMap, FieldValue};

    fn tagged(id: u64, tags: &[&str]) -> Document {
        let mut fields = FieldMap::new();
        fields.insert("tags".to_string(), FieldValue::List(tags.iter().map(|t| t.to_string()).collect()));
        Document::new(DocId(id), fields)
    }

    #[test]
    fn each_element_is_a_key() {
        let mut index = MultikeyIndex::new(IndexDefinition::multikey("tags"));
        index.insert(&tagged(1, &["rust", "db", "rust"])).unwrap();
        index.insert(&tagged(2, &["db"])).unwrap();

        let db: Vec<u64> = index.lookup(&IndexKey::Text("db".into())).iter().collect();
        assert_eq!(db, vec![1, 2]);
        assert_eq!(index.estimate(&IndexKey::Text("rust".into())), 1);
        assert_eq!(index.stats().entries, 3);
    }

    #[test]
    fn update_replaces_old_elements() {
        let mut index = MultikeyIndex::new(IndexDefinition::multikey("tags"));
        index.insert(&tagged(1, &["a", "b"])).unwrap();
        index.insert(&tagged(1, &["c"])).unwrap();

        assert!(index.lookup(&IndexKey::Text("a".into())).is_empty());
        assert_eq!(index.estimate(&IndexKey::Text("c".into())), 1);
    }

    #[test]
    fn empty_array_indexes_as_null() {
        let mut index = MultikeyIndex::new(IndexDefinition::multikey("tags"));
        index.insert(&tagged(1, &[])).unwrap();
        assert_eq!(index.estimate(&IndexKey::Null), 1);
    }
}
