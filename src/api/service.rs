use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use tracing::{info, warn};
use crate::api::requests::{ListFilters, SearchFilters};
use crate::api::responses::{ApiError, CreateResponse, ListResponse, CREATED_MESSAGE, LISTED_MESSAGE, SEARCHED_MESSAGE};
use crate::core::collection::Collection;
use crate::core::database::Database;
use crate::core::error::{ErrorKind, Result};
use crate::core::types::Document;
use crate::query::filter::Filter;
use crate::query::types::QueryOptions;
use crate::schema::profile::{profile_schema, PROFILES};

/// Function-call surface for an HTTP wrapper over the profiles collection
pub struct ProfileService {
    collection: Arc<Collection>,
    default_distance: f64,
    query_timeout: Option<Duration>,
}

impl ProfileService {
    /// Uses the database's profiles collection, creating it if needed
    pub fn new(db: &Database) -> Result<Self> {
        let collection = match db.collection(PROFILES) {
            Ok(collection) => collection,
            Err(err) if err.is(ErrorKind::NotFound) => db.create_collection(profile_schema())?,
            Err(err) => return Err(err),
        };
        Ok(ProfileService {
            collection,
            default_distance: db.config().default_geo_max_distance,
            query_timeout: None,
        })
    }

    /// Bounds every list/search call; expired calls fail with 503
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }

    fn options(&self) -> QueryOptions {
        match self.query_timeout {
            Some(timeout) => QueryOptions::new().with_timeout(timeout),
            None => QueryOptions::new(),
        }
    }

    pub fn create_document(&self, fields: &Value) -> CreateResponse {
        match self.collection.insert(fields) {
            Ok(doc) => CreateResponse::Created {
                message: CREATED_MESSAGE.to_string(),
                total_count: self.collection.count(),
                data: doc,
            },
            Err(err) => {
                warn!(error = %err, "create document failed");
                ApiError::from(err).into()
            }
        }
    }

    pub fn list_documents(&self, filters: &ListFilters) -> std::result::Result<ListResponse, ApiError> {
        let filter = filters.to_filter()?;
        let data = self.run(&filter)?;
        Ok(ListResponse::new(LISTED_MESSAGE, data))
    }

    pub fn search_documents(&self, filters: &SearchFilters) -> std::result::Result<ListResponse, ApiError> {
        let filter = filters.to_filter(self.default_distance)?;
        let data = self.run(&filter)?;
        Ok(ListResponse::new(SEARCHED_MESSAGE, data))
    }

    fn run(&self, filter: &Filter) -> std::result::Result<Vec<Document>, ApiError> {
        let results = self.collection.find(filter, &self.options()).map_err(|err| {
            warn!(error = %err, "query failed");
            ApiError::from(err)
        })?;
        info!(plan = %results.plan, total = results.total_hits, "query served");
        Ok(results.into_documents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::core::config::Config;

    fn service() -> ProfileService {
        ProfileService::new(&Database::open(Config::default()).unwrap()).unwrap()
    }

    #[test]
    fn create_reports_running_total() {
        let service = service();
        let first = service.create_document(&json!({"username": "a", "email": "a@x.com"}));
        assert_eq!(first.status_code(), 201);
        let second = service.create_document(&json!({"username": "b", "email": "b@x.com"}));
        assert!(matches!(second, CreateResponse::Created { total_count: 2, .. }));
    }

    #[test]
    fn duplicate_create_is_a_400() {
        let service = service();
        service.create_document(&json!({"username": "a", "email": "a@x.com"}));
        let dup = service.create_document(&json!({"username": "a", "email": "z@x.com"}));
        assert_eq!(dup.status_code(), 400);
    }

    #[test]
    fn reuses_existing_collection() {
        let db = Database::open(Config::default()).unwrap();
        let a = ProfileService::new(&db).unwrap();
        a.create_document(&json!({"username": "a", "email": "a@x.com"}));
        let b = ProfileService::new(&db).unwrap();
        assert_eq!(b.collection().count(), 1);
    }
}
