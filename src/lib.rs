pub mod core;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod scoring;
pub mod query;
pub mod search;
pub mod api;

pub use crate::core::collection::Collection;
pub use crate::core::config::{Config, ScanPolicy};
pub use crate::core::database::Database;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, FieldMap, FieldValue, GeoPoint};
pub use crate::index::definition::{Direction, IndexDefinition, IndexKind, PartialFilter};
pub use crate::query::filter::{Clause, Filter, FilterBuilder};
pub use crate::query::planner::{AccessPath, QueryPlan, Ranking};
pub use crate::query::types::QueryOptions;
pub use crate::schema::schema::{CollectionSchema, FieldType};
pub use crate::search::results::{ScoredDocument, SearchResults};

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                           DOCDEX STRUCT ARCHITECTURE                         │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────────┐
│  struct Database                                                             │
│  • config: Config                                                            │
│  • collections: RwLock<HashMap<String, Arc<Collection>>>                     │
│  • open: Arc<AtomicBool>          // shared with every Collection            │
│                                                                              │
│  struct Collection                                                           │
│  • schema: CollectionSchema       // casting, defaults, required fields      │
│  • state: RwLock<CollectionState> // documents + IndexManager, one lock      │
│  • planner: QueryPlanner                                                     │
│  • executor: QueryExecutor                                                   │
│  • version: AtomicU64             // bumped per committed write              │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── INDEX LAYER ─────────────────────────────────┐
│  struct IndexManager { indexes: Vec<IndexStructure> }                        │
│    check all ─▶ apply all ─▶ rollback on failure                             │
│                                                                              │
│  OrderedIndex   BTreeMap<CompoundKey, RoaringTreemap>   unique, prefix scan  │
│  MultikeyIndex  BTreeMap<IndexKey, RoaringTreemap>      one entry / element  │
│  TextIndex      HashMap<term, PostingList>              tf, positions        │
│  GeoIndex       BTreeMap<(cell_x, cell_y), RoaringTreemap>                   │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── QUERY LAYER ─────────────────────────────────┐
│  Filter ─▶ QueryPlanner::plan ─▶ QueryPlan { access, residual, ranking }     │
│                                      │                                       │
│                                      ▼                                       │
│  QueryExecutor::execute: candidates ─▶ DocumentMatcher ─▶ SearchResults      │
│                                                          (lazy heap)         │
└──────────────────────────────────────────────────────────────────────────────┘

┌───────────────────────────────── API LAYER ──────────────────────────────────┐
│  ProfileService: create_document / list_documents / search_documents         │
│  ListFilters, SearchFilters (query-string coercion), ApiError::status_code   │
└──────────────────────────────────────────────────────────────────────────────┘
*/
