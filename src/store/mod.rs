pub mod base;
pub mod mongodb_store;

// Re-export the primary items so code outside can do
// "use crate::store::{StatusSource, ScrapeError};"
pub use base::{ScrapeError, StatusSource};
pub use mongodb_store::MongoStatusSource;
