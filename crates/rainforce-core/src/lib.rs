//! Rainforce Core - Domain models, error taxonomy, and configuration
//!
//! This crate contains the core domain types and port definitions shared by the
//! rainfall forcing pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{RainforceError, Result};
