//! Coordinate reference system handling shared by all rainforce crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG codes of geographic (degree-based) CRSs the pipeline recognises
const GEOGRAPHIC_EPSG: [u32; 4] = [4326, 4167, 4269, 4258];

/// Coordinate Reference System identified by EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn new(epsg: u32, name: impl Into<String>) -> Self {
        Self { epsg, name: name.into() }
    }

    /// Build a CRS from a bare EPSG code, naming the well-known ones
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => Self::wgs84(),
            2193 => Self::nztm(),
            3857 => Self::new(3857, "Web Mercator"),
            other => Self::new(other, format!("EPSG:{}", other)),
        }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::new(4326, "WGS 84")
    }

    /// NZGD2000 / New Zealand Transverse Mercator 2000 (EPSG:2193)
    pub fn nztm() -> Self {
        Self::new(2193, "NZGD2000 / NZTM 2000")
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        GEOGRAPHIC_EPSG.contains(&self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{} ({})", self.epsg, self.name)
    }
}
