use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;
use chrono::{DateTime, Utc};

/// Identity assigned by the store. Monotonic, so identity order is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (longitude, latitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonPoint", try_from = "GeoJsonPoint")]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting coordinates outside the WGS84 ranges.
    pub fn new(lng: f64, lat: f64) -> Result<Self, String> {
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("longitude {} out of range [-180, 180]", lng));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(format!("latitude {} out of range [-90, 90]", lat));
        }
        Ok(GeoPoint { lng, lat })
    }
}

/// Wire shape of a point: `{"type": "Point", "coordinates": [lng, lat]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        GeoJsonPoint {
            kind: "Point".to_string(),
            coordinates: [point.lng, point.lat],
        }
    }
}

impl TryFrom<GeoJsonPoint> for GeoPoint {
    type Error = String;

    fn try_from(json: GeoJsonPoint) -> Result<Self, Self::Error> {
        if json.kind != "Point" {
            return Err(format!("unsupported geometry type '{}'", json.kind));
        }
        GeoPoint::new(json.coordinates[0], json.coordinates[1])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    List(Vec<String>),
    Geo(GeoPoint),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_geo(&self) -> Option<GeoPoint> {
        match self {
            FieldValue::Geo(point) => Some(*point),
            _ => None,
        }
    }

    /// Scalars can be used as equality operands
    pub fn is_scalar(&self) -> bool {
        matches!(self, FieldValue::Text(_) | FieldValue::Number(_) | FieldValue::Boolean(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "string",
            FieldValue::Number(_) => "number",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::List(_) => "array",
            FieldValue::Geo(_) => "point",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(value: GeoPoint) -> Self {
        FieldValue::Geo(value)
    }
}

pub type FieldMap = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: DocId,
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: DocId, fields: FieldMap) -> Self {
        let now = Utc::now();
        Document {
            id,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get_field(name).and_then(FieldValue::as_str)
    }

    pub fn geo(&self, name: &str) -> Option<GeoPoint> {
        self.get_field(name).and_then(FieldValue::as_geo)
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Every field type serializes infallibly
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_rejects_out_of_range() {
        assert!(GeoPoint::new(180.0, 90.0).is_ok());
        assert!(GeoPoint::new(180.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -90.1).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn document_serializes_with_geojson_location() {
        let mut fields = FieldMap::new();
        fields.insert("username".to_string(), "u1".into());
        fields.insert("location".to_string(), GeoPoint::new(10.0, 20.0).unwrap().into());
        let doc = Document::new(DocId(7), fields);

        let json = doc.to_json();
        assert_eq!(json["_id"], 7);
        assert_eq!(json["username"], "u1");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["location"]["coordinates"][0], 10.0);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn geojson_with_wrong_type_fails_to_deserialize() {
        let json = serde_json::json!({"type": "Polygon", "coordinates": [1.0, 2.0]});
        assert!(serde_json::from_value::<GeoPoint>(json).is_err());
    }
}
