pub mod diagnostic_helpers;
pub mod schema_fixtures;
