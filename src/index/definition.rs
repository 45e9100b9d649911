use serde::{Serialize, Deserialize};
use crate::core::types::{FieldMap, FieldValue};
use crate::index::key::IndexKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Single-field or compound ordered index
    Ordered,
    /// One entry per array element
    Multikey,
    Text,
    Geo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    pub direction: Direction,
}

/// Conjunction of field equalities a document must satisfy to be indexed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialFilter {
    pub conditions: Vec<(String, FieldValue)>,
}

impl PartialFilter {
    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        PartialFilter {
            conditions: vec![(field.to_string(), value.into())],
        }
    }

    pub fn matches(&self, fields: &FieldMap) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            let Some(expected) = IndexKey::from_scalar(expected) else {
                return false;
            };
            fields.get(field)
                .map(|actual| IndexKey::expand(Some(actual)).contains(&expected))
                .unwrap_or(false)
        })
    }
}

/// Static description of one secondary structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: IndexKind,
    pub fields: Vec<IndexField>,
    pub unique: bool,
    pub partial: Option<PartialFilter>,
}

impl IndexDefinition {
    fn build(kind: IndexKind, fields: Vec<IndexField>) -> Self {
        let suffix = |field: &IndexField| match (kind, field.direction) {
            (IndexKind::Text, _) => "text",
            (IndexKind::Geo, _) => "2dsphere",
            (_, Direction::Asc) => "1",
            (_, Direction::Desc) => "-1",
        };
        let name = fields.iter()
            .map(|f| format!("{}_{}", f.name, suffix(f)))
            .collect::<Vec<_>>()
            .join("_");

        IndexDefinition {
            name,
            kind,
            fields,
            unique: false,
            partial: None,
        }
    }

    /// Ordered index with every field ascending
    pub fn ascending(fields: &[&str]) -> Self {
        IndexDefinition::ordered(fields.iter().map(|f| (*f, Direction::Asc)).collect())
    }

    pub fn ordered(fields: Vec<(&str, Direction)>) -> Self {
        let fields = fields.into_iter()
            .map(|(name, direction)| IndexField { name: name.to_string(), direction })
            .collect();
        IndexDefinition::build(IndexKind::Ordered, fields)
    }

    pub fn multikey(field: &str) -> Self {
        IndexDefinition::build(IndexKind::Multikey, vec![IndexField {
            name: field.to_string(),
            direction: Direction::Asc,
        }])
    }

    pub fn text(fields: &[&str]) -> Self {
        let fields = fields.iter()
            .map(|name| IndexField { name: name.to_string(), direction: Direction::Asc })
            .collect();
        IndexDefinition::build(IndexKind::Text, fields)
    }

    pub fn geo(field: &str) -> Self {
        IndexDefinition::build(IndexKind::Geo, vec![IndexField {
            name: field.to_string(),
            direction: Direction::Asc,
        }])
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn partial(mut self, filter: PartialFilter) -> Self {
        self.partial = Some(filter);
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Whether a document belongs in this index at all
    pub fn covers(&self, fields: &FieldMap) -> bool {
        self.partial.as_ref().is_none_or(|filter| filter.matches(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_follow_mongo_convention() {
        assert_eq!(IndexDefinition::ascending(&["firstName", "lastName"]).name, "firstName_1_lastName_1");
        assert_eq!(IndexDefinition::ordered(vec![("age", Direction::Desc)]).name, "age_-1");
        assert_eq!(IndexDefinition::text(&["description"]).name, "description_text");
        assert_eq!(IndexDefinition::geo("location").name, "location_2dsphere");
        assert_eq!(IndexDefinition::multikey("tags").name, "tags_1");
    }

    #[test]
    fn partial_filter_gates_coverage() {
        let def = IndexDefinition::ascending(&["status"])
            .partial(PartialFilter::eq("status", "active"));

        let mut fields = FieldMap::new();
        fields.insert("status".to_string(), "inactive".into());
        assert!(!def.covers(&fields));

        fields.insert("status".to_string(), "active".into());
        assert!(def.covers(&fields));

        assert!(!def.covers(&FieldMap::new()));
    }
}
