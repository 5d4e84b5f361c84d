//! # searchme-retrieval
//!
//! The read path of searchme: embed a free-text query with the same model
//! used at indexing time, ask the vector index for the nearest positions
//! and resolve them to paths and records.
//!
//! Results keep the vector index's order (ascending distance) and are
//! never re-sorted. Searching never mutates the store.

pub mod error;
pub mod query;

pub use error::QueryError;
pub use query::{QueryEngine, SearchHit};
