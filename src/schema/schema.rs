use std::collections::HashSet;
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use tracing::debug;
use crate::core::error::{Error, Result};
use crate::core::types::{FieldMap, FieldValue, GeoPoint};
use crate::index::definition::{IndexDefinition, IndexKind};

/// Fields the store maintains itself; never accepted from callers
pub const SYSTEM_FIELDS: &[&str] = &["_id", "createdAt", "updatedAt"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    StringArray,
    GeoPoint,
    Enum(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub default: Option<FieldValue>,
}

/// Static declaration of a collection: fields, casting rules and indexes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub text_analyzer: String,
}

impl CollectionSchema {
    pub fn new(name: &str) -> Self {
        CollectionSchema {
            name: name.to_string(),
            fields: Vec::new(),
            indexes: Vec::new(),
            text_analyzer: "english".to_string(),
        }
    }

    pub fn field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.to_string(),
            field_type,
            required: false,
            default: None,
        });
        self
    }

    pub fn required_field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldDefinition {
            name: name.to_string(),
            field_type,
            required: true,
            default: None,
        });
        self
    }

    pub fn field_with_default(mut self, name: &str, field_type: FieldType, default: FieldValue) -> Self {
        self.fields.push(FieldDefinition {
            name: name.to_string(),
            field_type,
            required: false,
            default: Some(default),
        });
        self
    }

    pub fn index(mut self, definition: IndexDefinition) -> Self {
        self.indexes.push(definition);
        self
    }

    pub fn with_text_analyzer(mut self, analyzer: &str) -> Self {
        self.text_analyzer = analyzer.to_string();
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Checks the declaration itself: index fields exist and fit their index kind.
    pub fn validate_definition(&self) -> Result<()> {
        let mut field_names = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.name.starts_with('$') || SYSTEM_FIELDS.contains(&field.name.as_str()) {
                return Err(Error::invalid_input(format!("invalid field name '{}'", field.name)));
            }
            if !field_names.insert(field.name.as_str()) {
                return Err(Error::invalid_input(format!("field '{}' declared twice", field.name)));
            }
            if let Some(default) = &field.default {
                cast_value(field, &field_value_to_json(default))
                    .map_err(|e| Error::invalid_input(format!("bad default: {}", e.context)))?;
            }
        }

        let mut index_names = HashSet::new();
        let mut text_indexes = 0;
        for index in &self.indexes {
            if !index_names.insert(index.name.as_str()) {
                return Err(Error::invalid_input(format!("index '{}' declared twice", index.name)));
            }
            if index.fields.is_empty() {
                return Err(Error::invalid_input(format!("index '{}' covers no fields", index.name)));
            }
            for indexed in &index.fields {
                let field = self.get_field(&indexed.name).ok_or_else(|| {
                    Error::invalid_input(format!("index '{}' references unknown field '{}'", index.name, indexed.name))
                })?;
                let fits = match index.kind {
                    IndexKind::Ordered => field.field_type != FieldType::GeoPoint,
                    IndexKind::Multikey => field.field_type == FieldType::StringArray,
                    IndexKind::Text => field.field_type == FieldType::String,
                    IndexKind::Geo => field.field_type == FieldType::GeoPoint,
                };
                if !fits {
                    return Err(Error::invalid_input(format!(
                        "index '{}' cannot cover field '{}' of type {:?}",
                        index.name, indexed.name, field.field_type
                    )));
                }
            }
            match index.kind {
                IndexKind::Text | IndexKind::Geo if index.unique => {
                    return Err(Error::invalid_input(format!("index '{}' of kind {:?} cannot be unique", index.name, index.kind)));
                }
                IndexKind::Multikey | IndexKind::Geo if index.fields.len() != 1 => {
                    return Err(Error::invalid_input(format!("index '{}' must cover exactly one field", index.name)));
                }
                IndexKind::Text => text_indexes += 1,
                _ => {}
            }
            if let Some(partial) = &index.partial {
                for (field, value) in &partial.conditions {
                    if self.get_field(field).is_none() || !value.is_scalar() {
                        return Err(Error::invalid_input(format!(
                            "partial filter of index '{}' must compare a declared field to a scalar",
                            index.name
                        )));
                    }
                }
            }
        }
        if text_indexes > 1 {
            return Err(Error::invalid_input("a collection can have at most one text index"));
        }

        Ok(())
    }

    /// Casts caller input into a complete field map for a new document:
    /// casting, unknown-field handling, defaults, required checks.
    pub fn cast_document(&self, input: &Map<String, Value>, strict: bool) -> Result<FieldMap> {
        let mut fields = FieldMap::new();
        self.apply_input(&mut fields, input, strict)?;

        for field in &self.fields {
            if !fields.contains_key(&field.name) {
                if let Some(default) = &field.default {
                    fields.insert(field.name.clone(), default.clone());
                }
            }
        }

        self.check_required(&fields)?;
        Ok(fields)
    }

    /// Merges `changes` over `existing`; `null` unsets a field.
    pub fn merge_changes(&self, existing: &FieldMap, changes: &Map<String, Value>, strict: bool) -> Result<FieldMap> {
        let mut fields = existing.clone();
        self.apply_input(&mut fields, changes, strict)?;
        self.check_required(&fields)?;
        Ok(fields)
    }

    fn apply_input(&self, fields: &mut FieldMap, input: &Map<String, Value>, strict: bool) -> Result<()> {
        for (name, value) in input {
            if SYSTEM_FIELDS.contains(&name.as_str()) {
                continue;
            }
            let cast = match self.get_field(name) {
                Some(definition) => cast_value(definition, value)?,
                None if strict => {
                    debug!(collection = %self.name, field = %name, "dropping undeclared field");
                    continue;
                }
                None => {
                    if name.is_empty() || name.starts_with('$') {
                        return Err(Error::validation(format!("invalid field name '{}'", name)));
                    }
                    cast_untyped(name, value)?
                }
            };
            match cast {
                Some(value) => {
                    fields.insert(name.clone(), value);
                }
                None => {
                    fields.remove(name);
                }
            }
        }
        Ok(())
    }

    fn check_required(&self, fields: &FieldMap) -> Result<()> {
        for field in self.fields.iter().filter(|f| f.required) {
            match fields.get(&field.name) {
                None => {
                    return Err(Error::validation(format!("Path `{}` is required.", field.name)));
                }
                Some(FieldValue::Text(s)) if s.is_empty() => {
                    return Err(Error::validation(format!("Path `{}` is required.", field.name)));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Casts one JSON value per its declared type. `Ok(None)` means "absent".
pub fn cast_value(field: &FieldDefinition, value: &Value) -> Result<Option<FieldValue>> {
    if value.is_null() {
        return Ok(None);
    }
    let fail = || Error::validation(format!(
        "Cast to {:?} failed for value {} at path `{}`",
        field.field_type, value, field.name
    ));

    let cast = match &field.field_type {
        FieldType::String => FieldValue::Text(scalar_to_string(value).ok_or_else(fail)?),
        FieldType::Number => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match number {
                Some(n) if n.is_finite() => FieldValue::Number(n),
                _ => return Err(fail()),
            }
        }
        FieldType::Boolean => match value {
            Value::Bool(b) => FieldValue::Boolean(*b),
            Value::String(s) if s == "true" => FieldValue::Boolean(true),
            Value::String(s) if s == "false" => FieldValue::Boolean(false),
            _ => return Err(fail()),
        },
        FieldType::StringArray => match value {
            Value::Array(items) => {
                let mut strings = Vec::with_capacity(items.len());
                for item in items {
                    strings.push(scalar_to_string(item).ok_or_else(fail)?);
                }
                FieldValue::List(strings)
            }
            scalar => FieldValue::List(vec![scalar_to_string(scalar).ok_or_else(fail)?]),
        },
        FieldType::GeoPoint => FieldValue::Geo(cast_geo(&field.name, value)?),
        FieldType::Enum(allowed) => {
            let s = scalar_to_string(value).ok_or_else(fail)?;
            if !allowed.contains(&s) {
                return Err(Error::validation(format!(
                    "`{}` is not a valid enum value for path `{}`.",
                    s, field.name
                )));
            }
            FieldValue::Text(s)
        }
    };
    Ok(Some(cast))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn cast_geo(path: &str, value: &Value) -> Result<GeoPoint> {
    let object = value.as_object()
        .ok_or_else(|| Error::validation(format!("`{}` must be a GeoJSON point object", path)))?;

    match object.get("type") {
        None | Some(Value::Null) => {}
        Some(Value::String(kind)) if kind == "Point" => {}
        Some(other) => {
            return Err(Error::validation(format!(
                "`{}` is not a valid enum value for path `{}.type`.",
                other, path
            )));
        }
    }

    let coordinates = object.get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::validation(format!("`{}.coordinates` must be [longitude, latitude]", path)))?;
    if coordinates.len() != 2 {
        return Err(Error::validation(format!("`{}.coordinates` must hold exactly two numbers", path)));
    }
    let number = |v: &Value| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let (Some(lng), Some(lat)) = (number(&coordinates[0]), number(&coordinates[1])) else {
        return Err(Error::validation(format!("`{}.coordinates` must hold numbers", path)));
    };

    GeoPoint::new(lng, lat).map_err(|e| Error::validation(format!("`{}`: {}", path, e)))
}

/// Best-effort typing for fields the schema does not declare (non-strict mode)
fn cast_untyped(path: &str, value: &Value) -> Result<Option<FieldValue>> {
    let cast = match value {
        Value::Null => return Ok(None),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => FieldValue::Number(f),
            _ => return Err(Error::validation(format!("`{}` is not a finite number", path))),
        },
        Value::Array(items) => {
            let strings: Option<Vec<String>> = items.iter().map(scalar_to_string).collect();
            FieldValue::List(strings.ok_or_else(|| {
                Error::validation(format!("`{}` may only contain scalar elements", path))
            })?)
        }
        Value::Object(_) => FieldValue::Geo(cast_geo(path, value)?),
    };
    Ok(Some(cast))
}

fn field_value_to_json(value: &FieldValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::core::error::ErrorKind;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("people")
            .required_field("name", FieldType::String)
            .field("age", FieldType::Number)
            .field("tags", FieldType::StringArray)
            .field("home", FieldType::GeoPoint)
            .field_with_default("state", FieldType::Enum(vec!["on".into(), "off".into()]), "off".into())
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn casts_like_mongoose() {
        let fields = schema().cast_document(&object(json!({
            "name": 42,
            "age": "31",
            "tags": "solo",
            "home": {"coordinates": [10, 20]},
        })), true).unwrap();

        assert_eq!(fields["name"], FieldValue::Text("42".into()));
        assert_eq!(fields["age"], FieldValue::Number(31.0));
        assert_eq!(fields["tags"], FieldValue::List(vec!["solo".into()]));
        assert_eq!(fields["home"].as_geo().unwrap().lat, 20.0);
        assert_eq!(fields["state"], FieldValue::Text("off".into()));
    }

    #[test]
    fn missing_or_empty_required_field_fails() {
        let err = schema().cast_document(&object(json!({"age": 3})), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = schema().cast_document(&object(json!({"name": ""})), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn rejects_bad_enum_and_out_of_range_points() {
        let err = schema().cast_document(&object(json!({"name": "a", "state": "maybe"})), true).unwrap_err();
        assert!(err.context.contains("not a valid enum value"));

        let err = schema().cast_document(&object(json!({"name": "a", "home": {"coordinates": [200, 0]}})), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = schema().cast_document(&object(json!({"name": "a", "home": {"type": "Line", "coordinates": [1, 1]}})), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn strict_mode_drops_unknown_and_system_fields() {
        let fields = schema().cast_document(&object(json!({"name": "a", "nick": "b", "_id": 9})), true).unwrap();
        assert!(!fields.contains_key("nick"));
        assert!(!fields.contains_key("_id"));

        let fields = schema().cast_document(&object(json!({"name": "a", "nick": "b"})), false).unwrap();
        assert_eq!(fields["nick"], FieldValue::Text("b".into()));
    }

    #[test]
    fn merge_changes_unsets_with_null() {
        let existing = schema().cast_document(&object(json!({"name": "a", "age": 5})), true).unwrap();
        let merged = schema().merge_changes(&existing, &object(json!({"age": null, "state": "on"})), true).unwrap();
        assert!(!merged.contains_key("age"));
        assert_eq!(merged["state"], FieldValue::Text("on".into()));

        let err = schema().merge_changes(&existing, &object(json!({"name": null})), true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn definition_checks_index_field_types() {
        let bad = schema().index(IndexDefinition::text(&["age"]));
        assert!(bad.validate_definition().is_err());

        let bad = schema().index(IndexDefinition::geo("home").unique());
        assert!(bad.validate_definition().is_err());

        let good = schema()
            .index(IndexDefinition::ascending(&["name"]).unique())
            .index(IndexDefinition::multikey("tags"))
            .index(IndexDefinition::geo("home"));
        assert!(good.validate_definition().is_ok());
    }
}
