use std::collections::{BTreeMap, HashMap};
use roaring::RoaringTreemap;
use crate::core::error::Result;
use crate::core::types::{DocId, Document, GeoPoint};
use crate::index::definition::IndexDefinition;
use crate::index::{IndexStats, SecondaryIndex};
use crate::query::types::DeadlineGuard;
use crate::search::geo::{bounding_boxes, haversine_distance};

/// Smallest accepted cell edge, roughly 11 m at the equator
pub const MIN_CELL_SIZE_DEGREES: f64 = 1e-4;

/// Grid index over a single point field.
///
/// Points are bucketed into square cells of `cell_size` degrees. A radius
/// query visits the cells covering the radius's bounding boxes and then
/// filters candidates by exact distance.
pub struct GeoIndex {
    pub definition: IndexDefinition,
    pub field: String,
    pub cell_size: f64,
    pub cells: BTreeMap<(i64, i64), RoaringTreemap>,
    pub points: HashMap<DocId, GeoPoint>,
}

impl GeoIndex {
    pub fn new(definition: IndexDefinition, cell_size: f64) -> Self {
        let field = definition.fields.first()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        GeoIndex {
            definition,
            field,
            cell_size: cell_size.max(MIN_CELL_SIZE_DEGREES),
            cells: BTreeMap::new(),
            points: HashMap::new(),
        }
    }

    fn cell_coord(&self, degrees: f64) -> i64 {
        (degrees / self.cell_size).floor() as i64
    }

    fn cell_of(&self, point: &GeoPoint) -> (i64, i64) {
        (self.cell_coord(point.lng), self.cell_coord(point.lat))
    }

    /// Documents within `max_distance` meters of `center`, boundary
    /// inclusive, ascending by id.
    ///
    /// Each box is covered column by column, or by walking the occupied
    /// cells when there are fewer of those than columns. The guard is
    /// ticked per visited column or cell and per candidate.
    pub fn near(&self, center: &GeoPoint, max_distance: f64, guard: &mut DeadlineGuard) -> Result<Vec<(DocId, f64)>> {
        let mut candidates = RoaringTreemap::new();
        for bbox in bounding_boxes(center, max_distance) {
            let (min_x, max_x) = (self.cell_coord(bbox.min_lng), self.cell_coord(bbox.max_lng));
            let (min_y, max_y) = (self.cell_coord(bbox.min_lat), self.cell_coord(bbox.max_lat));
            let columns = (max_x - min_x + 1) as usize;

            if columns <= self.cells.len() {
                for x in min_x..=max_x {
                    guard.tick()?;
                    for (_, ids) in self.cells.range((x, min_y)..=(x, max_y)) {
                        candidates |= ids;
                    }
                }
            } else {
                for (&(_, y), ids) in self.cells.range((min_x, i64::MIN)..=(max_x, i64::MAX)) {
                    guard.tick()?;
                    if (min_y..=max_y).contains(&y) {
                        candidates |= ids;
                    }
                }
            }
        }

        let mut hits = Vec::new();
        for id in candidates.iter() {
            guard.tick()?;
            let doc_id = DocId(id);
            let Some(point) = self.points.get(&doc_id) else {
                continue;
            };
            let distance = haversine_distance(center, point);
            if distance <= max_distance {
                hits.push((doc_id, distance));
            }
        }
        Ok(hits)
    }
}

impl SecondaryIndex for GeoIndex {
    fn definition(&self) -> &IndexDefinition {
        &self.definition
    }

    fn insert(&mut self, doc: &Document) -> Result<()> {
        if self.points.contains_key(&doc.id) {
            self.remove(doc);
        }
        // Documents without a point are simply not indexed
        let Some(point) = doc.geo(&self.field) else {
            return Ok(());
        };
        let cell = self.cell_of(&point);
        self.cells.entry(cell).or_default().insert(doc.id.0);
        self.points.insert(doc.id, point);
        Ok(())
    }

    fn remove(&mut self, doc: &Document) {
        let Some(point) = self.points.remove(&doc.id) else {
            return;
        };
        let cell = self.cell_of(&point);
        if let Some(ids) = self.cells.get_mut(&cell) {
            ids.remove(doc.id.0);
            if ids.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    fn contains(&self, doc_id: DocId) -> bool {
        self.points.contains_key(&doc_id)
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            name: self.definition.name.clone(),
            kind: self.definition.kind,
            documents: self.points.len(),
            entries: self.points.len() as u64,
            distinct_keys: self.cells.len(),
        }
    }
}
