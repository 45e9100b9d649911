pub mod geo;
pub mod results;
pub mod executor;
