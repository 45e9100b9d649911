use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::core::types::GeoPoint;
use crate::query::filter::Filter;

pub const LOCATION_FIELD: &str = "location";

/// Filters of the listing endpoint; each present one is an equality
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListFilters {
    pub status: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
}

impl ListFilters {
    /// Builds filters from decoded query-string pairs. Empty values and
    /// unknown keys are ignored; a repeated key keeps its last value.
    pub fn from_query_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut filters = ListFilters::default();
        for (key, value) in pairs {
            let slot = match key {
                "status" => &mut filters.status,
                "tag" => &mut filters.tag,
                "firstName" => &mut filters.first_name,
                _ => continue,
            };
            *slot = non_empty(value);
        }
        filters
    }

    pub fn to_filter(&self) -> Result<Filter> {
        let mut builder = Filter::builder();
        if let Some(status) = &self.status {
            builder = builder.eq("status", status.as_str());
        }
        if let Some(tag) = &self.tag {
            builder = builder.eq("tags", tag.as_str());
        }
        if let Some(first_name) = &self.first_name {
            builder = builder.eq("firstName", first_name.as_str());
        }
        builder.build()
    }
}

/// Filters of the search endpoint. A geo clause is added only when both
/// coordinates are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub text: Option<String>,
    pub tag: Option<String>,
    pub lng: Option<f64>,
    pub lat: Option<f64>,
    /// Meters; `None` means the configured default
    pub distance: Option<f64>,
}

impl SearchFilters {
    /// Builds filters from decoded query-string pairs.
    ///
    /// Coordinates are read only when both `lng` and `lat` are present;
    /// each takes its longest numeric prefix (`"12.5km"` is 12.5) and fails
    /// if there is none. A lone coordinate is ignored. A distance that is
    /// missing, has no integer prefix, or is zero falls back to the default.
    pub fn from_query_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut filters = SearchFilters::default();
        let (mut raw_lng, mut raw_lat) = (None, None);
        for (key, value) in pairs {
            let Some(value) = non_empty(value) else {
                continue;
            };
            match key {
                "text" => filters.text = Some(value),
                "tag" => filters.tag = Some(value),
                "lng" => raw_lng = Some(value),
                "lat" => raw_lat = Some(value),
                "distance" => {
                    filters.distance = leading_integer(&value)
                        .filter(|d| *d != 0)
                        .map(|d| d as f64);
                }
                _ => {}
            }
        }
        if let (Some(lng), Some(lat)) = (raw_lng, raw_lat) {
            filters.lng = Some(parse_coordinate("lng", &lng)?);
            filters.lat = Some(parse_coordinate("lat", &lat)?);
        }
        Ok(filters)
    }

    pub fn to_filter(&self, default_distance: f64) -> Result<Filter> {
        let mut builder = Filter::builder();
        if let Some(text) = &self.text {
            builder = builder.text(text);
        }
        if let Some(tag) = &self.tag {
            builder = builder.eq("tags", tag.as_str());
        }
        if let (Some(lng), Some(lat)) = (self.lng, self.lat) {
            let center = GeoPoint::new(lng, lat).map_err(Error::validation)?;
            builder = builder.near(LOCATION_FIELD, center, self.distance.unwrap_or(default_distance));
        }
        builder.build()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_coordinate(name: &str, value: &str) -> Result<f64> {
    leading_float(value).ok_or_else(|| Error::invalid_input(format!(
        "'{}' must be a number, got '{}'", name, value
    )))
}

/// Longest prefix of `value` that parses as a float
fn leading_float(value: &str) -> Option<f64> {
    let value = value.trim_start();
    (1..=value.len())
        .rev()
        .filter(|end| value.is_char_boundary(*end))
        .find_map(|end| {
            let prefix = &value[..end];
            // Rust accepts "inf"/"nan" spellings that are not numbers here
            if prefix.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                return None;
            }
            prefix.parse::<f64>().ok().filter(|n| n.is_finite())
        })
}

/// Optional sign followed by decimal digits, ignoring whatever follows
fn leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let sign_len = usize::from(value.starts_with(['+', '-']));
    let digits = value[sign_len..].chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    value[..sign_len + digits].parse().ok()
}
