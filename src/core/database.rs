use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use parking_lot::RwLock;
use tracing::info;
use crate::core::collection::Collection;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::DatabaseStats;
use crate::schema::schema::CollectionSchema;

/// Process-wide registry of collections sharing one configuration
pub struct Database {
    config: Config,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    open: Arc<AtomicBool>,
    start_time: Instant,
}

impl Database {
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        info!(scan_policy = ?config.scan_policy, strict_schema = config.strict_schema, "database opened");
        Ok(Database {
            config,
            collections: RwLock::new(HashMap::new()),
            open: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Closed, "database is closed".to_string()))
        }
    }

    /// Registers a collection and builds its (empty) indexes
    pub fn create_collection(&self, schema: CollectionSchema) -> Result<Arc<Collection>> {
        self.ensure_open()?;
        let mut collections = self.collections.write();
        if collections.contains_key(&schema.name) {
            return Err(Error::invalid_input(format!("collection '{}' already exists", schema.name)));
        }

        let name = schema.name.clone();
        let index_count = schema.indexes.len();
        let collection = Arc::new(Collection::new(schema, self.config.clone(), self.open.clone())?);
        collections.insert(name.clone(), collection.clone());

        info!(collection = %name, indexes = index_count, "collection created");
        Ok(collection)
    }

    pub fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.ensure_open()?;
        self.collections.read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("collection '{}' does not exist", name)))
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn drop_collection(&self, name: &str) -> Result<()> {
        self.ensure_open()?;
        self.collections.write()
            .remove(name)
            .map(|_| info!(collection = %name, "collection dropped"))
            .ok_or_else(|| Error::not_found(format!("collection '{}' does not exist", name)))
    }

    /// Subsequent operations on the database and every collection handle
    /// fail with `Closed`
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            info!(uptime_secs = self.start_time.elapsed().as_secs(), "database closed");
        }
    }

    pub fn stats(&self) -> DatabaseStats {
        let mut collections: Vec<_> = self.collections.read()
            .values()
            .map(|c| c.stats())
            .collect();
        collections.sort_by(|a, b| a.name.cmp(&b.name));

        DatabaseStats {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_documents: collections.iter().map(|c| c.documents).sum(),
            collections,
        }
    }
}
