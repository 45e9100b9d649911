use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::CollectionStats;
use crate::core::types::{DocId, Document};
use crate::index::manager::IndexManager;
use crate::query::filter::Filter;
use crate::query::planner::{QueryPlan, QueryPlanner};
use crate::query::types::QueryOptions;
use crate::schema::schema::CollectionSchema;
use crate::search::executor::QueryExecutor;
use crate::search::results::SearchResults;

/// Documents and their indexes, always mutated together under one lock
struct CollectionState {
    documents: BTreeMap<DocId, Arc<Document>>,
    indexes: IndexManager,
    next_id: u64,
}

/// A named set of documents sharing one schema.
///
/// Writers hold the write lock across validation, constraint checks, the
/// store write and index maintenance, so readers observe either all or
/// none of a write. Queries run under the read lock.
pub struct Collection {
    name: String,
    schema: CollectionSchema,
    config: Config,
    planner: QueryPlanner,
    executor: QueryExecutor,
    state: RwLock<CollectionState>,
    version: AtomicU64,
    query_count: AtomicU64,
    write_count: AtomicU64,
    open: Arc<AtomicBool>,
}

impl Collection {
    pub(crate) fn new(schema: CollectionSchema, config: Config, open: Arc<AtomicBool>) -> Result<Self> {
        schema.validate_definition()?;
        let indexes = IndexManager::new(&schema, &config)?;

        Ok(Collection {
            name: schema.name.clone(),
            planner: QueryPlanner::new(&config),
            executor: QueryExecutor::new(config.scan_check_interval),
            state: RwLock::new(CollectionState {
                documents: BTreeMap::new(),
                indexes,
                next_id: 1,
            }),
            version: AtomicU64::new(0),
            query_count: AtomicU64::new(0),
            write_count: AtomicU64::new(0),
            schema,
            config,
            open,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Incremented by every successful write
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Closed, format!("database holding '{}' is closed", self.name)))
        }
    }

    fn as_object<'a>(&self, input: &'a Value) -> Result<&'a Map<String, Value>> {
        input.as_object().ok_or_else(|| Error::validation(format!(
            "document for '{}' must be a JSON object", self.name
        )))
    }

    fn committed(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    fn insert_locked(&self, state: &mut CollectionState, input: &Map<String, Value>) -> Result<Document> {
        let fields = self.schema.cast_document(input, self.config.strict_schema)?;
        let doc = Document::new(DocId(state.next_id), fields);

        if let Err(err) = state.indexes.insert(&doc) {
            debug!(collection = %self.name, error = %err, "insert rejected");
            return Err(err);
        }
        state.next_id += 1;
        state.documents.insert(doc.id, Arc::new(doc.clone()));
        self.committed();

        info!(collection = %self.name, doc_id = %doc.id, total = state.documents.len(), "document inserted");
        Ok(doc)
    }

    /// Validates, casts and stores a new document, returning it with its
    /// assigned id and timestamps
    pub fn insert(&self, input: &Value) -> Result<Document> {
        self.ensure_open()?;
        let input = self.as_object(input)?;
        let mut state = self.state.write();
        self.insert_locked(&mut state, input)
    }

    /// Inserts in order and stops at the first failure; documents before
    /// it stay inserted
    pub fn insert_many(&self, inputs: &[Value]) -> Result<Vec<Document>> {
        self.ensure_open()?;
        let mut state = self.state.write();
        let mut inserted = Vec::with_capacity(inputs.len());
        for (position, input) in inputs.iter().enumerate() {
            let doc = self.as_object(input)
                .and_then(|map| self.insert_locked(&mut state, map))
                .map_err(|err| Error::new(err.kind, format!("document {}: {}", position, err.context)))?;
            inserted.push(doc);
        }
        Ok(inserted)
    }

    pub fn get(&self, id: DocId) -> Result<Document> {
        self.ensure_open()?;
        self.state.read().documents.get(&id)
            .map(|doc| doc.as_ref().clone())
            .ok_or_else(|| Error::not_found(format!("document {} not found in '{}'", id, self.name)))
    }

    pub fn count(&self) -> usize {
        self.state.read().documents.len()
    }

    /// Applies `changes` over the stored fields; a `null` value unsets a
    /// field. Index entries, including partial index membership, follow.
    pub fn update(&self, id: DocId, changes: &Value) -> Result<Document> {
        self.ensure_open()?;
        let changes = self.as_object(changes)?;
        let mut state = self.state.write();

        let existing = state.documents.get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("document {} not found in '{}'", id, self.name)))?;
        let fields = self.schema.merge_changes(&existing.fields, changes, self.config.strict_schema)?;
        let updated = Document {
            id,
            fields,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        state.indexes.replace(&existing, &updated)?;
        state.documents.insert(id, Arc::new(updated.clone()));
        self.committed();

        info!(collection = %self.name, doc_id = %id, "document updated");
        Ok(updated)
    }

    pub fn delete(&self, id: DocId) -> Result<Document> {
        self.ensure_open()?;
        let mut state = self.state.write();
        let removed = state.documents.remove(&id)
            .ok_or_else(|| Error::not_found(format!("document {} not found in '{}'", id, self.name)))?;
        state.indexes.remove(&removed);
        self.committed();

        info!(collection = %self.name, doc_id = %id, "document deleted");
        Ok(Arc::unwrap_or_clone(removed))
    }

    /// Runs a filter and returns ranked matches.
    ///
    /// Results come from one consistent snapshot of documents and indexes.
    pub fn find(&self, filter: &Filter, options: &QueryOptions) -> Result<SearchResults> {
        self.ensure_open()?;
        filter.validate()?;
        self.query_count.fetch_add(1, Ordering::Relaxed);

        let state = self.state.read();
        let plan = self.planner.plan(filter, &state.indexes)?;
        let results = self.executor.execute(plan, &state.documents, &state.indexes, options);
        if let Err(err) = &results {
            if err.is(ErrorKind::InternalIndexInconsistency) {
                warn!(collection = %self.name, error = %err, "index and store disagree");
            }
        }
        results
    }

    /// The plan `find` would use, without running it
    pub fn explain(&self, filter: &Filter) -> Result<QueryPlan> {
        self.ensure_open()?;
        filter.validate()?;
        let state = self.state.read();
        self.planner.plan(filter, &state.indexes)
    }

    pub fn stats(&self) -> CollectionStats {
        let state = self.state.read();
        CollectionStats {
            name: self.name.clone(),
            documents: state.documents.len(),
            version: self.version(),
            queries: self.query_count.load(Ordering::Relaxed),
            writes: self.write_count.load(Ordering::Relaxed),
            indexes: state.indexes.stats(),
        }
    }
}
