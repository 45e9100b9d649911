use std::collections::{BTreeMap, HashMap};
use roaring::RoaringTreemap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{DocId, Document};
use crate::index::definition::IndexDefinition;
use crate::index::key::{display_key, CompoundKey, DirectedKey, IndexKey};
use crate::index::{IndexStats, SecondaryIndex};

/// Stored key tuple; each component carries its field's direction
type StoredKey = Vec<DirectedKey>;

/// Single-field or compound ordered index.
///
/// Keys are tuples in declared field order, each component sorted by its
/// field's direction. Identity sets iterate in ascending `DocId`, which is
/// insertion order, so equal keys tie-break by insertion. An array in a key
/// field contributes one key per element.
pub struct OrderedIndex {
    pub definition: IndexDefinition,
    entries: BTreeMap<StoredKey, RoaringTreemap>,
    doc_keys: HashMap<DocId, Vec<StoredKey>>,
    entry_count: u64,
}

impl OrderedIndex {
    pub fn new(definition: IndexDefinition) -> Self {
        OrderedIndex {
            definition,
            entries: BTreeMap::new(),
            doc_keys: HashMap::new(),
            entry_count: 0,
        }
    }

    /// All key tuples the document contributes
    pub fn keys_for(&self, doc: &Document) -> Result<Vec<CompoundKey>> {
        let mut per_field = Vec::with_capacity(self.definition.fields.len());
        let mut array_fields = 0;
        for field in &self.definition.fields {
            let keys = IndexKey::expand(doc.get_field(&field.name));
            if keys.len() > 1 {
                array_fields += 1;
            }
            per_field.push(keys);
        }
        if array_fields > 1 {
            return Err(Error::validation(format!(
                "cannot index parallel arrays in index '{}'",
                self.definition.name
            )));
        }

        let mut tuples: Vec<CompoundKey> = vec![Vec::new()];
        for keys in per_field {
            let mut next = Vec::with_capacity(tuples.len() * keys.len());
            for prefix in &tuples {
                for key in &keys {
                    let mut tuple = prefix.clone();
                    tuple.push(key.clone());
                    next.push(tuple);
                }
            }
            tuples = next;
        }
        Ok(tuples)
    }

    fn stored(&self, key: &[IndexKey]) -> StoredKey {
        key.iter()
            .zip(&self.definition.fields)
            .map(|(key, field)| DirectedKey::new(key.clone(), field.direction))
            .collect()
    }

    /// Identities whose key starts with `prefix`, ascending by id
    pub fn lookup_prefix(&self, prefix: &[IndexKey]) -> RoaringTreemap {
        let mut result = RoaringTreemap::new();
        for (_, ids) in self.scan_prefix(prefix) {
            result |= ids;
        }
        result
    }

    /// Number of entries under `prefix`, used as the planner's estimate
    pub fn estimate_prefix(&self, prefix: &[IndexKey]) -> u64 {
        self.scan_prefix(prefix).map(|(_, ids)| ids.len()).sum()
    }

    /// Keys starting with `prefix` in index order, honouring each field's
    /// direction, with the identities stored under them
    pub fn scan_prefix(&self, prefix: &[IndexKey]) -> impl Iterator<Item = (CompoundKey, &RoaringTreemap)> + '_ {
        let start = self.stored(prefix);
        let len = start.len();
        self.entries
            .range(start.clone()..)
            .take_while(move |(key, _)| key[..len.min(key.len())] == start[..])
            .map(|(key, ids)| (key.iter().map(|k| k.key().clone()).collect(), ids))
    }

    fn conflicting_id(&self, key: &[IndexKey], doc_id: DocId) -> Option<u64> {
        self.entries.get(&self.stored(key))?.iter().find(|id| *id != doc_id.0)
    }
}

impl SecondaryIndex for OrderedIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    fn check_insert(&self, doc: &Document) -> Result<()> {
        let keys = self.keys_for(doc)?;
        if !self.definition.unique {
            return Ok(());
        }
        for key in &keys {
            // Absent values are not constrained
            if key.iter().any(IndexKey::is_null) {
                continue;
            }
            if let Some(existing) = self.conflicting_id(key, doc.id) {
                let fields = self.definition.field_names().join(", ");
                return Err(Error::new(
                    ErrorKind::UniqueConstraintViolation,
                    format!(
                        "duplicate key in index '{}' on ({}): {} already used by document {}",
                        self.definition.name, fields, display_key(key), existing
                    ),
                ));
            }
        }
        Ok(())
    }

    fn insert(&mut self, doc: &Document) -> Result<()> {
        let keys: Vec<StoredKey> = self.keys_for(doc)?
            .iter()
            .map(|key| self.stored(key))
            .collect();
        if self.doc_keys.contains_key(&doc.id) {
            self.remove(doc);
        }
        for key in &keys {
            if self.entries.entry(key.clone()).or_default().insert(doc.id.0) {
                self.entry_count += 1;
            }
        }
        self.doc_keys.insert(doc.id, keys);
        Ok(())
    }

    fn remove(&mut self, doc: &Document) {
        let Some(keys) = self.doc_keys.remove(&doc.id) else {
            return;
        };
        for key in keys {
            if let Some(ids) = self.entries.get_mut(&key) {
                if ids.remove(doc.id.0) {
                    self.entry_count -= 1;
                }
                if ids.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    fn contains(&self, doc_id: DocId) -> bool {
        self.doc_keys.contains_key(&doc_id)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            name: self.definition.name.clone(),
            kind: self.definition.kind,
            documents: self.doc_keys.len(),
            entries: self.entry_count,
            distinct_keys: self.entries.len(),
        }
    }
}
