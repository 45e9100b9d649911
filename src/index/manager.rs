use tracing::{debug, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::types::Document;
use crate::index::definition::IndexKind;
use crate::index::geo::GeoIndex;
use crate::index::multikey::MultikeyIndex;
use crate::index::ordered::OrderedIndex;
use crate::index::text::TextIndex;
use crate::index::{IndexStats, SecondaryIndex};
use crate::schema::schema::CollectionSchema;

pub enum IndexStructure {
    Ordered(OrderedIndex),
    Multikey(MultikeyIndex),
    Text(TextIndex),
    Geo(GeoIndex),
}

impl IndexStructure {
    pub fn as_index(&self) -> &dyn SecondaryIndex {
        match self {
            IndexStructure::Ordered(index) => index,
            IndexStructure::Multikey(index) => index,
            IndexStructure::Text(index) => index,
            IndexStructure::Geo(index) => index,
        }
    }

    pub fn as_index_mut(&mut self) -> &mut dyn SecondaryIndex {
        match self {
            IndexStructure::Ordered(index) => index,
            IndexStructure::Multikey(index) => index,
            IndexStructure::Text(index) => index,
            IndexStructure::Geo(index) => index,
        }
    }

    pub fn name(&self) -> &str {
        &self.as_index().definition().name
    }
}

/// Owns every secondary structure of a collection and keeps them in step
/// with the document store.
///
/// Mutations check all constraints before touching any structure, so a
/// rejected write leaves every index as it was.
pub struct IndexManager {
    pub indexes: Vec<IndexStructure>,
}

impl IndexManager {
    pub fn new(schema: &CollectionSchema, config: &Config) -> Result<Self> {
        let mut indexes = Vec::with_capacity(schema.indexes.len());
        for definition in &schema.indexes {
            let structure = match definition.kind {
                IndexKind::Ordered => IndexStructure::Ordered(OrderedIndex::new(definition.clone())),
                IndexKind::Multikey => IndexStructure::Multikey(MultikeyIndex::new(definition.clone())),
                IndexKind::Text => {
                    let analyzer = Analyzer::by_name(&schema.text_analyzer).ok_or_else(|| {
                        Error::validation(format!("unknown text analyzer '{}'", schema.text_analyzer))
                    })?;
                    IndexStructure::Text(TextIndex::new(definition.clone(), analyzer))
                }
                IndexKind::Geo => {
                    IndexStructure::Geo(GeoIndex::new(definition.clone(), config.geo_cell_size_degrees))
                }
            };
            debug!(collection = %schema.name, index = %definition.name, kind = ?definition.kind, "index created");
            indexes.push(structure);
        }
        Ok(IndexManager { indexes })
    }

    pub fn get(&self, name: &str) -> Option<&IndexStructure> {
        self.indexes.iter().find(|index| index.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexStructure> {
        self.indexes.iter()
    }

    pub fn text_index(&self) -> Option<&TextIndex> {
        self.indexes.iter().find_map(|index| match index {
            IndexStructure::Text(text) => Some(text),
            _ => None,
        })
    }

    pub fn geo_index(&self, field: &str) -> Option<&GeoIndex> {
        self.indexes.iter().find_map(|index| match index {
            IndexStructure::Geo(geo) if geo.field == field => Some(geo),
            _ => None,
        })
    }

    /// Constraint check against every index the document would enter
    pub fn check(&self, doc: &Document) -> Result<()> {
        for index in &self.indexes {
            let index = index.as_index();
            if index.definition().covers(&doc.fields) {
                index.check_insert(doc)?;
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, doc: &Document) -> Result<()> {
        self.check(doc)?;
        if let Err(err) = self.apply(doc) {
            for index in &mut self.indexes {
                index.as_index_mut().remove(doc);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Moves a document from its `old` entries to its `new` ones. Partial
    /// index membership follows the new field values.
    pub fn replace(&mut self, old: &Document, new: &Document) -> Result<()> {
        self.check(new)?;
        for index in &mut self.indexes {
            index.as_index_mut().remove(old);
        }
        if let Err(err) = self.apply(new) {
            for index in &mut self.indexes {
                index.as_index_mut().remove(new);
            }
            if let Err(restore) = self.apply(old) {
                warn!(doc_id = %old.id, error = %restore, "failed to restore index entries after rollback");
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn remove(&mut self, doc: &Document) {
        for index in &mut self.indexes {
            index.as_index_mut().remove(doc);
        }
    }

    fn apply(&mut self, doc: &Document) -> Result<()> {
        for index in &mut self.indexes {
            let index = index.as_index_mut();
            if index.definition().covers(&doc.fields) {
                index.insert(doc)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> Vec<IndexStats> {
        self.indexes.iter().map(|index| index.as_index().stats()).collect()
    }
}
