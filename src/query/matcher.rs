use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Document;
use crate::index::key::IndexKey;
use crate::query::filter::Clause;
use crate::search::geo::haversine_distance;

/// Outcome of checking residual clauses against one document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    Rejected,
    /// Accepted; carries the distance when a geo clause was evaluated
    Accepted { distance: Option<f64> },
}

/// Evaluates clauses directly against document contents. Used for
/// residual clauses after index access and for full scans.
pub struct DocumentMatcher;

impl DocumentMatcher {
    pub fn matches(clauses: &[Clause], doc: &Document) -> Result<Verdict> {
        let mut distance = None;
        for clause in clauses {
            match clause {
                Clause::Eq { .. } | Clause::In { .. } => {
                    let wanted = clause.equality_keys().unwrap_or_default();
                    let field = clause.field().unwrap_or_default();
                    let present = IndexKey::expand(doc.get_field(field));
                    // Absent fields expand to Null, which no scalar key equals
                    if !wanted.iter().any(|key| present.contains(key)) {
                        return Ok(Verdict::Rejected);
                    }
                }
                Clause::GeoNear { field, center, max_distance } => {
                    let Some(point) = doc.geo(field) else {
                        return Ok(Verdict::Rejected);
                    };
                    let d = haversine_distance(center, &point);
                    if d > *max_distance {
                        return Ok(Verdict::Rejected);
                    }
                    distance = Some(d);
                }
                Clause::Text(_) => {
                    return Err(Error::new(
                        ErrorKind::UnsupportedQuery,
                        "text clauses can only be answered by a text index".to_string(),
                    ));
                }
            }
        }
        Ok(Verdict::Accepted { distance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DocId, FieldMap, FieldValue, GeoPoint};
    use crate::query::text::TextQuery;

    fn profile() -> Document {
        let mut fields = FieldMap::new();
        fields.insert("status".to_string(), "active".into());
        fields.insert("tags".to_string(), FieldValue::List(vec!["rust".into(), "db".into()]));
        fields.insert("location".to_string(), FieldValue::Geo(GeoPoint::new(0.0, 0.0).unwrap()));
        Document::new(DocId(1), fields)
    }

    fn eq(field: &str, value: &str) -> Clause {
        Clause::Eq { field: field.to_string(), value: value.into() }
    }

    #[test]
    fn equality_reaches_into_arrays() {
        let doc = profile();
        assert_eq!(DocumentMatcher::matches(&[eq("tags", "db")], &doc).unwrap(),
                   Verdict::Accepted { distance: None });
        assert_eq!(DocumentMatcher::matches(&[eq("tags", "go")], &doc).unwrap(), Verdict::Rejected);
        assert_eq!(DocumentMatcher::matches(&[eq("missing", "x")], &doc).unwrap(), Verdict::Rejected);
    }

    #[test]
    fn in_matches_any_value() {
        let clause = Clause::In {
            field: "status".to_string(),
            values: vec!["inactive".into(), "active".into()],
        };
        assert!(matches!(DocumentMatcher::matches(&[clause], &profile()).unwrap(), Verdict::Accepted { .. }));

        let empty = Clause::In { field: "status".to_string(), values: vec![] };
        assert_eq!(DocumentMatcher::matches(&[empty], &profile()).unwrap(), Verdict::Rejected);
    }

    #[test]
    fn geo_reports_distance() {
        let clause = Clause::GeoNear {
            field: "location".to_string(),
            center: GeoPoint::new(0.0, 0.0).unwrap(),
            max_distance: 10.0,
        };
        assert_eq!(DocumentMatcher::matches(&[clause], &profile()).unwrap(),
                   Verdict::Accepted { distance: Some(0.0) });
    }

    #[test]
    fn text_is_not_evaluable_without_index() {
        let err = DocumentMatcher::matches(&[Clause::Text(TextQuery::parse("x"))], &profile()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedQuery);
    }
}
