use std::cmp::{Ordering, Reverse};
use serde::{Serialize, Deserialize};
use crate::core::types::FieldValue;
use crate::index::definition::Direction;

/// Orderable form of a scalar field value.
/// Cross-type order: Null < Number < Text < Boolean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexKey {
    Null,
    Number(f64),
    Text(String),
    Boolean(bool),
}

/// Key tuple of an ordered index, one component per indexed field
pub type CompoundKey = Vec<IndexKey>;

impl IndexKey {
    pub fn from_scalar(value: &FieldValue) -> Option<IndexKey> {
        match value {
            // -0.0 and 0.0 must collide
            FieldValue::Number(n) => Some(IndexKey::Number(if *n == 0.0 { 0.0 } else { *n })),
            FieldValue::Text(s) => Some(IndexKey::Text(s.clone())),
            FieldValue::Boolean(b) => Some(IndexKey::Boolean(*b)),
            FieldValue::List(_) | FieldValue::Geo(_) => None,
        }
    }

    /// Every key a field value contributes: one per array element,
    /// a single `Null` when the field is absent or an empty array.
    pub fn expand(value: Option<&FieldValue>) -> Vec<IndexKey> {
        match value {
            None => vec![IndexKey::Null],
            Some(FieldValue::List(items)) if items.is_empty() => vec![IndexKey::Null],
            Some(FieldValue::List(items)) => {
                let mut keys: Vec<IndexKey> = items.iter()
                    .map(|item| IndexKey::Text(item.clone()))
                    .collect();
                keys.sort();
                keys.dedup();
                keys
            }
            Some(FieldValue::Geo(_)) => Vec::new(),
            Some(scalar) => IndexKey::from_scalar(scalar).into_iter().collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, IndexKey::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            IndexKey::Null => 0,
            IndexKey::Number(_) => 1,
            IndexKey::Text(_) => 2,
            IndexKey::Boolean(_) => 3,
        }
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Number(a), IndexKey::Number(b)) => a.total_cmp(b),
            (IndexKey::Text(a), IndexKey::Text(b)) => a.cmp(b),
            (IndexKey::Boolean(a), IndexKey::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::fmt::Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKey::Null => write!(f, "null"),
            IndexKey::Number(n) => write!(f, "{}", n),
            IndexKey::Text(s) => write!(f, "{:?}", s),
            IndexKey::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A key component as stored by an ordered index; components of
/// descending fields compare reversed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DirectedKey {
    Asc(IndexKey),
    Desc(Reverse<IndexKey>),
}

impl DirectedKey {
    pub fn new(key: IndexKey, direction: Direction) -> Self {
        match direction {
            Direction::Asc => DirectedKey::Asc(key),
            Direction::Desc => DirectedKey::Desc(Reverse(key)),
        }
    }

    pub fn key(&self) -> &IndexKey {
        match self {
            DirectedKey::Asc(key) | DirectedKey::Desc(Reverse(key)) => key,
        }
    }
}

/// Renders a compound key as `(a, b)` for error messages
pub fn display_key(key: &[IndexKey]) -> String {
    let parts: Vec<String> = key.iter().map(|k| k.to_string()).collect();
    format!("({})", parts.join(", "))
}
