//! Rainforce Geo - Geometry, CRS, and spatial partitioning
//!
//! This crate handles geometry parsing and validation, CRS checks, area
//! computation, and the two geometric pipeline stages: partitioning a region
//! into site influence areas and resolving the coverage of a catchment.

pub mod coverage;
pub mod index;
pub mod models;
pub mod spatial;
pub mod transform;
pub mod validation;
pub mod voronoi;

pub use coverage::{renormalize, resolve_coverage};
pub use voronoi::partition;
