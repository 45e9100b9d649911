pub mod text;
pub mod filter;
pub mod types;
pub mod matcher;
pub mod planner;
