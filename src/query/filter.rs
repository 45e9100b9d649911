use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::core::types::{FieldValue, GeoPoint};
use crate::index::key::IndexKey;
use crate::query::text::TextQuery;

/// One conjunct of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    /// Field equals value; for an array field, any element equals it
    Eq { field: String, value: FieldValue },
    /// Field equals any of the values
    In { field: String, values: Vec<FieldValue> },
    /// Collection text search against the text index
    Text(TextQuery),
    /// Point field within `max_distance` meters of `center`
    GeoNear { field: String, center: GeoPoint, max_distance: f64 },
}

impl Clause {
    pub fn field(&self) -> Option<&str> {
        match self {
            Clause::Eq { field, .. } | Clause::In { field, .. } | Clause::GeoNear { field, .. } => Some(field),
            Clause::Text(_) => None,
        }
    }

    /// Sorted, deduplicated keys of an equality-style clause
    pub fn equality_keys(&self) -> Option<Vec<IndexKey>> {
        let mut keys: Vec<IndexKey> = match self {
            Clause::Eq { value, .. } => IndexKey::from_scalar(value).into_iter().collect(),
            Clause::In { values, .. } => values.iter().filter_map(IndexKey::from_scalar).collect(),
            _ => return None,
        };
        keys.sort();
        keys.dedup();
        Some(keys)
    }
}

/// Conjunction of clauses. The empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub clauses: Vec<Clause>,
}

impl Filter {
    pub fn all() -> Self {
        Filter::default()
    }

    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn text_clause(&self) -> Option<(usize, &TextQuery)> {
        self.clauses.iter().enumerate().find_map(|(i, clause)| match clause {
            Clause::Text(query) => Some((i, query)),
            _ => None,
        })
    }

    pub fn geo_clause(&self) -> Option<(usize, &str, &GeoPoint, f64)> {
        self.clauses.iter().enumerate().find_map(|(i, clause)| match clause {
            Clause::GeoNear { field, center, max_distance } => Some((i, field.as_str(), center, *max_distance)),
            _ => None,
        })
    }

    /// First equality-style clause on `field` with its keys
    pub fn equality_on(&self, field: &str) -> Option<(usize, Vec<IndexKey>)> {
        self.clauses.iter().enumerate().find_map(|(i, clause)| {
            if clause.field() != Some(field) {
                return None;
            }
            clause.equality_keys().map(|keys| (i, keys))
        })
    }

    pub fn validate(&self) -> Result<()> {
        let mut text_clauses = 0;
        let mut geo_clauses = 0;

        for clause in &self.clauses {
            if let Some(field) = clause.field() {
                validate_field_name(field)?;
            }
            match clause {
                Clause::Eq { field, value } => validate_scalar(field, value)?,
                Clause::In { field, values } => {
                    for value in values {
                        validate_scalar(field, value)?;
                    }
                }
                Clause::Text(query) => {
                    text_clauses += 1;
                    if !query.has_positive() {
                        return Err(Error::validation("text search needs at least one term or phrase"));
                    }
                }
                Clause::GeoNear { max_distance, .. } => {
                    geo_clauses += 1;
                    if !(max_distance.is_finite() && *max_distance >= 0.0) {
                        return Err(Error::validation(format!(
                            "max distance must be a non-negative number of meters, got {}",
                            max_distance
                        )));
                    }
                }
            }
        }

        if text_clauses > 1 {
            return Err(Error::validation("a filter may contain at most one text clause"));
        }
        if geo_clauses > 1 {
            return Err(Error::validation("a filter may contain at most one geo clause"));
        }
        Ok(())
    }
}

fn validate_field_name(field: &str) -> Result<()> {
    if field.is_empty() || field.starts_with('$') {
        return Err(Error::validation(format!("invalid field name '{}'", field)));
    }
    Ok(())
}

fn validate_scalar(field: &str, value: &FieldValue) -> Result<()> {
    match value {
        FieldValue::Number(n) if !n.is_finite() => Err(Error::validation(format!(
            "cannot compare field '{}' with non-finite number", field
        ))),
        value if value.is_scalar() => Ok(()),
        other => Err(Error::validation(format!(
            "field '{}' can only be compared with a scalar, got {}", field, other.type_name()
        ))),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    clauses: Vec<Clause>,
}

impl FilterBuilder {
    pub fn eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.clauses.push(Clause::Eq { field: field.to_string(), value: value.into() });
        self
    }

    pub fn is_in<V: Into<FieldValue>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.clauses.push(Clause::In {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn text(mut self, search: &str) -> Self {
        self.clauses.push(Clause::Text(TextQuery::parse(search)));
        self
    }

    pub fn near(mut self, field: &str, center: GeoPoint, max_distance: f64) -> Self {
        self.clauses.push(Clause::GeoNear { field: field.to_string(), center, max_distance });
        self
    }

    pub fn build(self) -> Result<Filter> {
        let filter = Filter { clauses: self.clauses };
        filter.validate()?;
        Ok(filter)
    }
}
