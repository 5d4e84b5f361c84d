//! # searchme-vector
//!
//! Storage side of the searchme index.
//!
//! - [`VectorIndex`]: append-only nearest-neighbour index keyed by
//!   [`IndexPosition`](searchme_types::IndexPosition), implemented by the
//!   usearch-backed [`HnswIndex`]
//! - [`RecordStore`]: owns the vector index, the position to path mapping
//!   and the path to record mapping, keeps them in agreement and persists
//!   all three together
//!
//! The store, not the index library, hands out positions: the next
//! position is always the number of positions already assigned.

pub mod error;
pub mod hnsw;
pub mod index;
pub mod persist;
pub mod store;

pub use error::{StoreError, VectorError};
pub use hnsw::{HnswConfig, HnswIndex};
pub use index::{Neighbor, VectorIndex};
pub use persist::{INDEX_FILE, MAPPING_FILE, METADATA_FILE, PERSIST_FORMAT_VERSION};
pub use store::{RecordStore, StoreConfig, StoreStats};
