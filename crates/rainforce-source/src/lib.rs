//! Rainforce Source - Upstream rainfall statistics adapters
//!
//! Implementations of the `RainfallSource` port: an HTTP client for a remote
//! depth-duration-frequency service and a file-backed table for offline runs.

pub mod http;
pub mod table;

pub use http::HttpRainfallSource;
pub use table::{StatisticRecord, TableRainfallSource};
