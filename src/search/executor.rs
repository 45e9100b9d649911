use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use roaring::RoaringTreemap;
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::index::manager::{IndexManager, IndexStructure};
use crate::query::matcher::{DocumentMatcher, Verdict};
use crate::query::planner::{AccessPath, QueryPlan};
use crate::query::types::{DeadlineGuard, QueryOptions};
use crate::scoring::scorer::{Scorer, TfIdfScorer};
use crate::search::results::{ScoredDocument, SearchResults};

/// Candidate produced by an access path before residual filtering
struct Candidate {
    id: DocId,
    score: Option<f32>,
    distance: Option<f64>,
}

/// Runs a plan against a consistent view of documents and indexes
pub struct QueryExecutor {
    pub scorer: Box<dyn Scorer>,
    pub check_interval: usize,
}

impl QueryExecutor {
    pub fn new(check_interval: usize) -> Self {
        QueryExecutor {
            scorer: Box::new(TfIdfScorer),
            check_interval,
        }
    }

    pub fn execute(
        &self,
        plan: QueryPlan,
        documents: &BTreeMap<DocId, Arc<Document>>,
        indexes: &IndexManager,
        options: &QueryOptions,
    ) -> Result<SearchResults> {
        let start = Instant::now();
        let mut guard = DeadlineGuard::new(options.deadline, self.check_interval);

        let candidates = self.candidates(&plan.access, documents, indexes, &mut guard)?;
        let examined = candidates.len();

        let mut hits = Vec::new();
        for candidate in candidates {
            guard.tick()?;
            let document = documents.get(&candidate.id).ok_or_else(|| Error::inconsistency(format!(
                "index returned document {} which is not in the store", candidate.id
            )))?;

            match DocumentMatcher::matches(&plan.residual, document)? {
                Verdict::Rejected => continue,
                Verdict::Accepted { distance } => hits.push(ScoredDocument {
                    document: Arc::clone(document),
                    score: candidate.score,
                    distance: candidate.distance.or(distance),
                }),
            }
        }

        let took_ms = start.elapsed().as_millis() as u64;
        debug!(
            plan = %plan,
            scorer = self.scorer.name(),
            examined,
            matched = hits.len(),
            took_ms,
            "query executed"
        );
        Ok(SearchResults::new(hits, plan, options.skip, options.limit, took_ms))
    }

    fn candidates(
        &self,
        access: &AccessPath,
        documents: &BTreeMap<DocId, Arc<Document>>,
        indexes: &IndexManager,
        guard: &mut DeadlineGuard,
    ) -> Result<Vec<Candidate>> {
        let plain = |ids: RoaringTreemap| -> Vec<Candidate> {
            ids.iter().map(|id| Candidate { id: DocId(id), score: None, distance: None }).collect()
        };

        match access {
            AccessPath::FullScan => {
                let mut ids = Vec::with_capacity(documents.len());
                for id in documents.keys() {
                    guard.tick()?;
                    ids.push(Candidate { id: *id, score: None, distance: None });
                }
                Ok(ids)
            }
            AccessPath::IndexLookup { index, prefixes, .. } => {
                let Some(IndexStructure::Ordered(ordered)) = indexes.get(index) else {
                    return Err(missing_index(index));
                };
                let mut ids = RoaringTreemap::new();
                for prefix in prefixes {
                    ids |= ordered.lookup_prefix(prefix);
                }
                Ok(plain(ids))
            }
            AccessPath::MultikeyLookup { index, keys, .. } => {
                let Some(IndexStructure::Multikey(multikey)) = indexes.get(index) else {
                    return Err(missing_index(index));
                };
                let mut ids = RoaringTreemap::new();
                for key in keys {
                    ids |= multikey.lookup(key);
                }
                Ok(plain(ids))
            }
            AccessPath::TextSearch { index, query } => {
                let Some(IndexStructure::Text(text)) = indexes.get(index) else {
                    return Err(missing_index(index));
                };
                Ok(text.search(query, self.scorer.as_ref(), guard)?
                    .into_iter()
                    .map(|(id, score)| Candidate { id, score: Some(score), distance: None })
                    .collect())
            }
            AccessPath::GeoNear { index, center, max_distance } => {
                let Some(IndexStructure::Geo(geo)) = indexes.get(index) else {
                    return Err(missing_index(index));
                };
                Ok(geo.near(center, *max_distance, guard)?
                    .into_iter()
                    .map(|(id, distance)| Candidate { id, score: None, distance: Some(distance) })
                    .collect())
            }
        }
    }
}

fn missing_index(name: &str) -> Error {
    Error::inconsistency(format!("planned index '{}' does not exist", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::error::ErrorKind;
    use crate::core::types::FieldMap;
    use crate::index::key::IndexKey;
    use crate::query::planner::Ranking;
    use crate::schema::profile::profile_schema;

    fn store(n: u64) -> (BTreeMap<DocId, Arc<Document>>, IndexManager) {
        let mut manager = IndexManager::new(&profile_schema(), &Config::default()).unwrap();
        let mut documents = BTreeMap::new();
        for id in 1..=n {
            let mut fields = FieldMap::new();
            fields.insert("username".to_string(), format!("user{}", id).as_str().into());
            fields.insert("status".to_string(), "active".into());
            let doc = Document::new(DocId(id), fields);
            manager.insert(&doc).unwrap();
            documents.insert(doc.id, Arc::new(doc));
        }
        (documents, manager)
    }

    #[test]
    fn missing_store_entry_is_an_inconsistency() {
        let (mut documents, manager) = store(2);
        documents.remove(&DocId(2));
        let plan = QueryPlan {
            access: AccessPath::IndexLookup {
                index: "status_1".to_string(),
                prefixes: vec![vec![IndexKey::Text("active".into())]],
                estimate: 2,
            },
            residual: vec![],
            ranking: Ranking::Insertion,
        };
        let err = QueryExecutor::new(16)
            .execute(plan, &documents, &manager, &QueryOptions::new())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalIndexInconsistency);
    }

    #[test]
    fn full_scan_honours_deadline() {
        let (documents, manager) = store(10);
        let plan = QueryPlan { access: AccessPath::FullScan, residual: vec![], ranking: Ranking::Insertion };
        let past = Instant::now().checked_sub(std::time::Duration::from_secs(1)).unwrap();
        let err = QueryExecutor::new(4)
            .execute(plan, &documents, &manager, &QueryOptions::new().with_deadline(past))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DeadlineExceeded);
    }
}
