//! KingTable state core
//!
//! Client-side table state management: fetch orchestration with out-of-order
//! response protection, pagination and subset math, column inference from
//! sample records, search filter lifecycle, and synchronization of paging state
//! with the URL query string and a persistent store.

pub mod column;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod location;
pub mod pagination;
pub mod response;
pub mod schema;
pub mod sort;
pub mod storage;
pub mod transport;

mod table;

pub use response::FetchOutcome;
pub use response::Loaded;
pub use response::Origin;
pub use table::*;

/// A single record as received from the data source.
pub type Row = serde_json::Map<String, serde_json::Value>;
