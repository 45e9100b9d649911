use std::fmt;
use serde::Serialize;
use tracing::debug;
use crate::core::config::{Config, ScanPolicy};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::GeoPoint;
use crate::index::definition::IndexDefinition;
use crate::index::key::{display_key, CompoundKey, IndexKey};
use crate::index::manager::{IndexManager, IndexStructure};
use crate::index::multikey::MultikeyIndex;
use crate::index::ordered::OrderedIndex;
use crate::query::filter::{Clause, Filter};
use crate::query::text::TextQuery;

/// How candidate identities are produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AccessPath {
    FullScan,
    /// Leftmost-prefix lookups on an ordered index
    IndexLookup { index: String, prefixes: Vec<CompoundKey>, estimate: u64 },
    MultikeyLookup { index: String, keys: Vec<IndexKey>, estimate: u64 },
    TextSearch { index: String, query: TextQuery },
    GeoNear { index: String, center: GeoPoint, max_distance: f64 },
}

/// Result ordering implied by the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ranking {
    /// Ascending identity, i.e. insertion order
    Insertion,
    TextScore,
    Distance,
    /// Text score, then distance for equal scores
    TextScoreThenDistance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub access: AccessPath,
    /// Clauses the access path does not answer; checked per document
    pub residual: Vec<Clause>,
    pub ranking: Ranking,
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.access {
            AccessPath::FullScan => write!(f, "COLLSCAN")?,
            AccessPath::IndexLookup { index, prefixes, estimate } => {
                let keys: Vec<String> = prefixes.iter().map(|p| display_key(p)).collect();
                write!(f, "IXSCAN {} [{}] estimate={}", index, keys.join(", "), estimate)?
            }
            AccessPath::MultikeyLookup { index, keys, estimate } => {
                write!(f, "MULTIKEY {} {} estimate={}", index, display_key(keys), estimate)?
            }
            AccessPath::TextSearch { index, query } => write!(f, "TEXT {} {:?}", index, query.raw)?,
            AccessPath::GeoNear { index, center, max_distance } => {
                write!(f, "GEO_NEAR {} ({}, {}) <= {}m", index, center.lng, center.lat, max_distance)?
            }
        }
        write!(f, " residual={} ranking={:?}", self.residual.len(), self.ranking)
    }
}

/// Chooses one access path per query.
///
/// A text clause always drives the plan, then a geo clause with a geo
/// index. Otherwise the equality-answering index with the smallest
/// estimate wins, earlier declared indexes winning ties. With no usable
/// index the plan is a full scan, unless scans are forbidden.
pub struct QueryPlanner {
    pub scan_policy: ScanPolicy,
    pub max_in_expansion: usize,
}

struct Candidate {
    access: AccessPath,
    consumed: Vec<usize>,
    estimate: u64,
}

impl QueryPlanner {
    pub fn new(config: &Config) -> Self {
        QueryPlanner {
            scan_policy: config.scan_policy,
            max_in_expansion: config.max_in_expansion,
        }
    }

    pub fn plan(&self, filter: &Filter, indexes: &IndexManager) -> Result<QueryPlan> {
        let geo = filter.geo_clause();

        if let Some((text_pos, query)) = filter.text_clause() {
            let index = indexes.text_index().ok_or_else(|| Error::new(
                ErrorKind::UnsupportedQuery,
                "text search requires a text index".to_string(),
            ))?;
            let ranking = if geo.is_some() { Ranking::TextScoreThenDistance } else { Ranking::TextScore };
            return Ok(self.finish(filter, AccessPath::TextSearch {
                index: index.definition.name.clone(),
                query: query.clone(),
            }, &[text_pos], ranking));
        }

        if let Some((geo_pos, field, center, max_distance)) = geo {
            if let Some(index) = indexes.geo_index(field) {
                return Ok(self.finish(filter, AccessPath::GeoNear {
                    index: index.definition.name.clone(),
                    center: *center,
                    max_distance,
                }, &[geo_pos], Ranking::Distance));
            }
        }

        let ranking = if geo.is_some() { Ranking::Distance } else { Ranking::Insertion };

        let mut best: Option<Candidate> = None;
        for structure in indexes.iter() {
            let candidate = match structure {
                IndexStructure::Ordered(index) => self.ordered_candidate(index, filter),
                IndexStructure::Multikey(index) => self.multikey_candidate(index, filter),
                _ => None,
            };
            if let Some(candidate) = candidate {
                if best.as_ref().is_none_or(|b| candidate.estimate < b.estimate) {
                    best = Some(candidate);
                }
            }
        }

        if let Some(best) = best {
            return Ok(self.finish(filter, best.access, &best.consumed, ranking));
        }

        if self.scan_policy == ScanPolicy::Forbid {
            return Err(Error::new(
                ErrorKind::UnsupportedQuery,
                "no index can answer this filter and full scans are forbidden".to_string(),
            ));
        }
        Ok(self.finish(filter, AccessPath::FullScan, &[], ranking))
    }

    fn finish(&self, filter: &Filter, access: AccessPath, consumed: &[usize], ranking: Ranking) -> QueryPlan {
        let residual = filter.clauses.iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .map(|(_, clause)| clause.clone())
            .collect();
        let plan = QueryPlan { access, residual, ranking };
        debug!(plan = %plan, "query planned");
        plan
    }

    fn ordered_candidate(&self, index: &OrderedIndex, filter: &Filter) -> Option<Candidate> {
        if !partial_implied(&index.definition, filter) {
            return None;
        }

        let mut prefixes: Vec<CompoundKey> = vec![Vec::new()];
        let mut consumed = Vec::new();
        for field in &index.definition.fields {
            let Some((pos, keys)) = filter.equality_on(&field.name) else {
                break;
            };
            if prefixes.len() * keys.len() > self.max_in_expansion {
                break;
            }
            prefixes = prefixes.iter()
                .flat_map(|prefix| keys.iter().map(move |key| {
                    let mut next = prefix.clone();
                    next.push(key.clone());
                    next
                }))
                .collect();
            consumed.push(pos);
        }
        if consumed.is_empty() {
            return None;
        }

        let estimate = prefixes.iter().map(|p| index.estimate_prefix(p)).sum();
        Some(Candidate {
            access: AccessPath::IndexLookup {
                index: index.definition.name.clone(),
                prefixes,
                estimate,
            },
            consumed,
            estimate,
        })
    }

    fn multikey_candidate(&self, index: &MultikeyIndex, filter: &Filter) -> Option<Candidate> {
        if !partial_implied(&index.definition, filter) {
            return None;
        }
        let (pos, keys) = filter.equality_on(&index.field)?;
        if keys.len() > self.max_in_expansion {
            return None;
        }
        let estimate = keys.iter().map(|k| index.estimate(k)).sum();
        Some(Candidate {
            access: AccessPath::MultikeyLookup {
                index: index.definition.name.clone(),
                keys,
                estimate,
            },
            consumed: vec![pos],
            estimate,
        })
    }
}

/// A partial index only holds documents matching its predicate, so it can
/// answer a filter only when the filter's equalities force that predicate
fn partial_implied(definition: &IndexDefinition, filter: &Filter) -> bool {
    let Some(partial) = &definition.partial else {
        return true;
    };
    partial.conditions.iter().all(|(field, expected)| {
        let Some(expected) = IndexKey::from_scalar(expected) else {
            return false;
        };
        filter.clauses.iter().any(|clause| {
            clause.field() == Some(field.as_str())
                && clause.equality_keys().is_some_and(|keys| keys == [expected.clone()])
        })
    })
}
