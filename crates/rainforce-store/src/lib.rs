//! Rainforce Store - Storage ports and adapters
//!
//! This crate defines the persistence ports of the pipeline (site registry,
//! influence-area cache, statistics cache) and provides in-memory and
//! PostgreSQL adapter implementations.

pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::{MemoryInfluenceAreaStore, MemorySiteRegistry, MemoryStatisticsStore};
pub use ports::{InfluenceAreaStore, SiteRegistry, StatisticsStore};
