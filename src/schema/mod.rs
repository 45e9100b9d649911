pub mod schema;
pub mod profile;
