use crate::core::types::FieldValue;
use crate::index::definition::{IndexDefinition, PartialFilter};
use crate::schema::schema::{CollectionSchema, FieldType};

pub const PROFILES: &str = "profiles";

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

/// The profile collection served by the HTTP wrapper.
///
/// Indexes: unique `username` and `email`, compound `(firstName, lastName)`,
/// multikey `tags`, text `description`, geospatial `location`, and `status`
/// partially indexed for active profiles only.
pub fn profile_schema() -> CollectionSchema {
    CollectionSchema::new(PROFILES)
        .required_field("username", FieldType::String)
        .required_field("email", FieldType::String)
        .field("firstName", FieldType::String)
        .field("lastName", FieldType::String)
        .field("tags", FieldType::StringArray)
        .field("description", FieldType::String)
        .field("location", FieldType::GeoPoint)
        .field_with_default(
            "status",
            FieldType::Enum(vec![STATUS_ACTIVE.to_string(), STATUS_INACTIVE.to_string()]),
            FieldValue::Text(STATUS_INACTIVE.to_string()),
        )
        .index(IndexDefinition::ascending(&["username"]).unique())
        .index(IndexDefinition::ascending(&["email"]).unique())
        .index(IndexDefinition::ascending(&["firstName", "lastName"]))
        .index(IndexDefinition::multikey("tags"))
        .index(IndexDefinition::text(&["description"]))
        .index(IndexDefinition::geo("location"))
        .index(IndexDefinition::ascending(&["status"])
            .partial(PartialFilter::eq("status", STATUS_ACTIVE)))
}
